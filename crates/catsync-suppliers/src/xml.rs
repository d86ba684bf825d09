//! Generic XML element tree.
//!
//! Supplier XML feeds are parsed into [`XmlElement`] trees first, so every
//! field normalizer extracts from the same mapping structure regardless of
//! the source encoding.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FeedError;

#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// First direct child with the given tag name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given tag name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first direct child with the given tag name.
    #[must_use]
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim()).filter(|t| !t.is_empty())
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parses an XML document into its root [`XmlElement`].
///
/// # Errors
///
/// Returns [`FeedError::Xml`] on syntax errors and
/// [`FeedError::MalformedXml`] on structural problems (no root element,
/// unbalanced tags).
pub fn parse_document(xml: &str) -> Result<XmlElement, FeedError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(element_from_tag(e.name().as_ref(), e.attributes()));
            }
            Ok(Event::Empty(e)) => {
                let element = element_from_tag(e.name().as_ref(), e.attributes());
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| FeedError::MalformedXml {
                    reason: "closing tag without matching opening tag".to_owned(),
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = e.unescape().unwrap_or_default();
                    append_text(top, text.trim());
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    append_text(top, text.trim());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Xml(e)),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FeedError::MalformedXml {
            reason: "document ended with unclosed elements".to_owned(),
        });
    }

    root.ok_or_else(|| FeedError::MalformedXml {
        reason: "document has no root element".to_owned(),
    })
}

fn element_from_tag(name: &[u8], attributes: quick_xml::events::attributes::Attributes) -> XmlElement {
    let attrs = attributes
        .flatten()
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                a.unescape_value().unwrap_or_default().into_owned(),
            )
        })
        .collect();
    XmlElement {
        name: String::from_utf8_lossy(name).into_owned(),
        attributes: attrs,
        text: String::new(),
        children: Vec::new(),
    }
}

fn append_text(element: &mut XmlElement, text: &str) {
    if text.is_empty() {
        return;
    }
    if !element.text.is_empty() {
        element.text.push(' ');
    }
    element.text.push_str(text);
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), FeedError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(FeedError::MalformedXml {
            reason: "multiple root elements".to_owned(),
        });
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog date="2024-02-01">
  <items>
    <item id="42">
      <name>Mug &amp; lid</name>
      <price>120.50</price>
      <empty/>
      <note><![CDATA[keep <as is>]]></note>
    </item>
    <item id="43">
      <name>Pen</name>
    </item>
  </items>
</catalog>"#;

    #[test]
    fn parses_nested_structure() {
        let root = parse_document(SAMPLE).unwrap();
        assert_eq!(root.name, "catalog");
        assert_eq!(root.attr("date"), Some("2024-02-01"));
        let items = root.child("items").unwrap();
        assert_eq!(items.children_named("item").count(), 2);
    }

    #[test]
    fn unescapes_entities_in_text() {
        let root = parse_document(SAMPLE).unwrap();
        let item = root.child("items").unwrap().child("item").unwrap();
        assert_eq!(item.text_of("name"), Some("Mug & lid"));
        assert_eq!(item.text_of("price"), Some("120.50"));
    }

    #[test]
    fn preserves_cdata_verbatim() {
        let root = parse_document(SAMPLE).unwrap();
        let item = root.child("items").unwrap().child("item").unwrap();
        assert_eq!(item.text_of("note"), Some("keep <as is>"));
    }

    #[test]
    fn empty_elements_become_children() {
        let root = parse_document(SAMPLE).unwrap();
        let item = root.child("items").unwrap().child("item").unwrap();
        assert!(item.child("empty").is_some());
        assert_eq!(item.text_of("empty"), None);
    }

    #[test]
    fn attr_lookup_by_name() {
        let root = parse_document(SAMPLE).unwrap();
        let ids: Vec<_> = root
            .child("items")
            .unwrap()
            .children_named("item")
            .map(|i| i.attr("id").unwrap_or(""))
            .collect();
        assert_eq!(ids, vec!["42", "43"]);
    }

    #[test]
    fn rejects_empty_document() {
        let err = parse_document("   ").unwrap_err();
        assert!(matches!(err, FeedError::MalformedXml { .. }));
    }

    #[test]
    fn rejects_unclosed_element() {
        // Depending on the reader config this surfaces as either a syntax
        // error or our own unbalanced-stack check; both are failures.
        assert!(parse_document("<a><b></b>").is_err());
    }
}
