//! Sample HTML documents for conversion tests
//!
//! Each fixture mimics content a rich-text import typically sees.

// Release notes mixing convertible markup with a table that must be kept
pub const RELEASE_NOTES: &str = r#"<h1>Release notes</h1>
<p>Version <strong>2.0</strong> ships with <em>faster</em> parsing.</p>
<ul>
  <li>New <a href="https://example.com/docs">docs</a></li>
  <li>Fixed <code>parse_all</code></li>
</ul>
<table><tr><td>kept</td></tr></table>
<p>See <a href="https://example.com">https://example.com</a>.</p>"#;

// Paragraph pasted from a word processor
pub const WORD_PASTE: &str = r#"<p>Plain <span lang="EN-US">Word</span> text<o:p>&nbsp;</o:p></p>"#;

// Paragraph carrying a style attribute, which makes it unsupported
pub const STYLED_PARAGRAPH: &str = r#"<p class="MsoNormal">Styled <b>text</b></p>"#;

// Quote with a nested list and a code sample
pub const QUOTED_STEPS: &str = "<blockquote><p>Steps:</p><ol><li>Install</li><li>Run</li></ol></blockquote>\
<pre><code>cargo install html2markdown<br/>html2markdown page.html</code></pre>";

// Every fixture, for property checks
pub const ALL: &[&str] = &[RELEASE_NOTES, WORD_PASTE, STYLED_PARAGRAPH, QUOTED_STEPS];
