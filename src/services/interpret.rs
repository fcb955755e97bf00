// src/services/interpret.rs

//! Portal page interpreters.
//!
//! Two stateless parsers over portal HTML: the document page
//! (`resource/x-bb-document`) and the assignment upload page. Both
//! tolerate malformed or missing sub-elements; absent elements simply
//! contribute nothing. The raw-text entry points are kept free of I/O so
//! they can be exercised directly against fixture pages.

use scraper::{ElementRef, Html, Selector};

use crate::services::Session;
use crate::utils::html::element_text;

/// Extracted contents of a document page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpretedDocument {
    /// Page title
    pub title: String,

    /// Accumulated free text of the details container
    pub text: String,

    /// Attachment URLs in document order
    pub attachments: Vec<String>,

    /// Notes about structural classes the walker did not recognize;
    /// empty when the page matched the expected shape
    pub exception: String,
}

/// Extracted contents of an assignment page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpretedAssignment {
    /// Plain text of the assignment's list blocks
    pub content: String,

    /// Hrefs collected from the instructions block
    pub attachments: Vec<String>,
}

/// Fetch and interpret a document page. `None` on HTTP failure; the
/// caller decides whether to report and continue.
pub async fn interpret_document(session: &Session, path: &str) -> Option<InterpretedDocument> {
    let html = session.fetch_text(path).await?;
    Some(parse_document_page(&html))
}

/// Fetch and interpret an assignment page. `None` on HTTP failure.
pub async fn interpret_assignment_page(
    session: &Session,
    path: &str,
) -> Option<InterpretedAssignment> {
    let html = session.fetch_text(path).await?;
    Some(parse_assignment_page(&html))
}

/// Parse a document page from its raw HTML.
pub fn parse_document_page(html: &str) -> InterpretedDocument {
    let doc = Html::parse_document(html);
    let mut result = InterpretedDocument::default();

    if let Some(sel) = parse_selector("#pageTitleText") {
        if let Some(title) = doc.select(&sel).next() {
            result.title = element_text(title);
        }
    }

    if let Some(sel) = parse_selector(".details") {
        if let Some(details) = doc.select(&sel).next() {
            walk_details(details, &mut result);
        }
    }

    result
}

/// Recursive walk of the details container, dispatching on each child's
/// structural class.
fn walk_details(element: ElementRef, result: &mut InterpretedDocument) {
    for child in element.children().filter_map(ElementRef::wrap) {
        let class = child.value().attr("class").unwrap_or("");

        if class.contains("vtbegenerated") {
            for block in child.children().filter_map(ElementRef::wrap) {
                result.text.push_str(&element_text(block));
                result.text.push('\n');
            }
        } else if class.contains("contextItemDetailsHeaders") {
            walk_details(child, result);
        } else if class.contains("detailsLabel") {
            result.text.push('\n');
            result.text.push_str(&element_text(child));
            result.text.push('\n');
        } else if class.contains("detailsValue") {
            walk_details(child, result);
        } else if class.contains("attachments") {
            collect_attachments(child, result);
        } else {
            result
                .exception
                .push_str(&format!("Unhandled class '{class}' in document details\n"));
        }
    }
}

/// Pull link text and hrefs out of an attachments list.
fn collect_attachments(list: ElementRef, result: &mut InterpretedDocument) {
    for item in child_elements(list, "li") {
        let Some(anchor) = child_elements(item, "a").next() else {
            continue;
        };
        result.text.push_str("    ");
        result.text.push_str(&element_text(anchor));
        result.text.push('\n');
        if let Some(href) = anchor.value().attr("href") {
            result.attachments.push(href.to_string());
        }
    }
}

/// Parse an assignment page from its raw HTML.
pub fn parse_assignment_page(html: &str) -> InterpretedAssignment {
    let doc = Html::parse_document(html);
    let mut result = InterpretedAssignment::default();

    let Some(block_sel) = parse_selector("#stepcontent1 ol li") else {
        return result;
    };

    for block in doc.select(&block_sel) {
        result.content.push_str(&element_text(block));
        result.content.push('\n');

        if block.value().attr("id") == Some("instructions") {
            if let Some(link_sel) = parse_selector("a") {
                for link in block.select(&link_sel) {
                    if let Some(href) = link.value().attr("href") {
                        if !href.is_empty() {
                            result.attachments.push(href.to_string());
                        }
                    }
                }
            }
        }
    }

    result
}

/// Direct element children with the given tag name.
fn child_elements<'a>(
    element: ElementRef<'a>,
    name: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == name)
}

/// Fixed selector literals never fail to parse; `None` keeps the parsers
/// total anyway.
fn parse_selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT_PAGE: &str = r#"
        <html><body>
        <h1 id="pageTitleText">Week 3 Notes</h1>
        <div class="details">
            <div class="vtbegenerated">
                <p>Read chapter 4 before class.</p>
                <p>Quiz on Friday.</p>
            </div>
            <div class="detailsLabel">Attached Files</div>
            <div class="detailsValue">
                <div class="attachments clearfix">
                    <li><a href="/bbcswebdav/notes-week3.pdf">notes-week3.pdf</a></li>
                    <li><a href="/bbcswebdav/slides-week3.pdf">slides-week3.pdf</a></li>
                </div>
            </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn document_page_extracts_title_text_and_attachments() {
        let result = parse_document_page(DOCUMENT_PAGE);

        assert_eq!(result.title, "Week 3 Notes");
        assert!(result.text.contains("Read chapter 4 before class."));
        assert!(result.text.contains("Quiz on Friday."));
        assert!(result.text.contains("Attached Files"));
        assert!(result.text.contains("notes-week3.pdf"));
        assert_eq!(
            result.attachments,
            vec![
                "/bbcswebdav/notes-week3.pdf".to_string(),
                "/bbcswebdav/slides-week3.pdf".to_string(),
            ]
        );
        assert!(result.exception.is_empty());
    }

    #[test]
    fn document_page_recurses_into_header_containers() {
        let html = r#"
            <div class="details">
                <div class="contextItemDetailsHeaders">
                    <div class="detailsLabel">Description</div>
                </div>
            </div>
        "#;
        let result = parse_document_page(html);
        assert!(result.text.contains("Description"));
    }

    #[test]
    fn document_page_notes_unrecognized_classes() {
        let html = r#"
            <div class="details">
                <div class="someNewWidget">surprise</div>
                <div class="detailsLabel">Still Works</div>
            </div>
        "#;
        let result = parse_document_page(html);

        assert!(result.exception.contains("someNewWidget"));
        assert!(result.text.contains("Still Works"));
    }

    #[test]
    fn document_page_tolerates_missing_structure() {
        let result = parse_document_page("<html><body><p>nothing here</p></body></html>");
        assert_eq!(result, InterpretedDocument::default());
    }

    #[test]
    fn document_attachment_without_anchor_is_skipped() {
        let html = r#"
            <div class="details">
                <div class="attachments">
                    <li>bare text item</li>
                    <li><a href="/f.pdf">f.pdf</a></li>
                </div>
            </div>
        "#;
        let result = parse_document_page(html);
        assert_eq!(result.attachments, vec!["/f.pdf".to_string()]);
    }

    const ASSIGNMENT_PAGE: &str = r#"
        <html><body>
        <div id="stepcontent1">
            <ol>
                <li id="dueDate">Due: 2020-03-01 23:59</li>
                <li id="instructions">
                    Submit a single PDF.
                    <a href="/bbcswebdav/hw3-spec.pdf">hw3-spec.pdf</a>
                    <a href="/bbcswebdav/template.tex">template.tex</a>
                    <a name="no-href-anchor">not a link</a>
                </li>
            </ol>
        </div>
        </body></html>
    "#;

    #[test]
    fn assignment_page_extracts_blocks_and_instruction_links() {
        let result = parse_assignment_page(ASSIGNMENT_PAGE);

        assert!(result.content.contains("Due: 2020-03-01 23:59"));
        assert!(result.content.contains("Submit a single PDF."));
        assert_eq!(
            result.attachments,
            vec![
                "/bbcswebdav/hw3-spec.pdf".to_string(),
                "/bbcswebdav/template.tex".to_string(),
            ]
        );
    }

    #[test]
    fn assignment_links_outside_instructions_are_not_attachments() {
        let html = r#"
            <div id="stepcontent1"><ol>
                <li id="other"><a href="/elsewhere.pdf">x</a></li>
            </ol></div>
        "#;
        let result = parse_assignment_page(html);
        assert!(result.attachments.is_empty());
        assert!(result.content.contains("x"));
    }

    #[test]
    fn assignment_page_tolerates_missing_container() {
        let result = parse_assignment_page("<html><body></body></html>");
        assert_eq!(result, InterpretedAssignment::default());
    }
}
