//! Preference value model and its property-list encoding.
//!
//! Scalars are written with an explicit `defaults` type tag; lists and
//! mappings can only be written as inline XML property-list fragments.
use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar preference value written with a `defaults` type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    /// `-string`
    String(String),
    /// `-int`
    Integer(i64),
    /// `-bool`
    Boolean(bool),
}

impl Scalar {
    /// The `defaults write` type flag for this value.
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        match self {
            Self::String(_) => "-string",
            Self::Integer(_) => "-int",
            Self::Boolean(_) => "-bool",
        }
    }

    /// Comparable text form: booleans become `1`/`0`, matching how
    /// `defaults read` prints them.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            other => other.literal(),
        }
    }

    /// Text passed on the `defaults write` command line.
    #[must_use]
    pub fn literal(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// A preference value as written in the manifest.
///
/// Deserializes untagged from TOML booleans, integers, strings, arrays and
/// tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    /// Boolean scalar.
    Boolean(bool),
    /// Integer scalar.
    Integer(i64),
    /// String scalar.
    String(String),
    /// Ordered list.
    List(Vec<Self>),
    /// String-keyed mapping.
    Map(BTreeMap<String, Self>),
}

impl PrefValue {
    /// Return the scalar form, or `None` for lists and mappings.
    #[must_use]
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Boolean(b) => Some(Scalar::Boolean(*b)),
            Self::Integer(i) => Some(Scalar::Integer(*i)),
            Self::String(s) => Some(Scalar::String(s.clone())),
            Self::List(_) | Self::Map(_) => None,
        }
    }

    /// Convert into a property-list value.
    #[must_use]
    pub fn to_plist(&self) -> plist::Value {
        match self {
            Self::Boolean(b) => plist::Value::Boolean(*b),
            Self::Integer(i) => plist::Value::Integer((*i).into()),
            Self::String(s) => plist::Value::String(s.clone()),
            Self::List(items) => plist::Value::Array(items.iter().map(Self::to_plist).collect()),
            Self::Map(map) => {
                let mut dict = plist::Dictionary::new();
                for (k, v) in map {
                    dict.insert(k.clone(), v.to_plist());
                }
                plist::Value::Dictionary(dict)
            }
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(items) => write!(f, "[{} items]", items.len()),
            Self::Map(map) => write!(f, "{{{} keys}}", map.len()),
            scalar => match scalar.as_scalar() {
                Some(s) => write!(f, "{s}"),
                None => Ok(()),
            },
        }
    }
}

const PLIST_OPEN: &str = "<plist version=\"1.0\">";
const PLIST_CLOSE: &str = "</plist>";

/// Serialize `value` as a single-line XML fragment without the document
/// envelope, e.g. `<dict><key>1</key><string>y-MM-dd</string></dict>`.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn to_fragment(value: &plist::Value) -> Result<String> {
    let mut buf = Vec::new();
    value
        .to_writer_xml(&mut buf)
        .context("serializing property list")?;
    let document = String::from_utf8(buf).context("property list is not UTF-8")?;
    let body = document
        .split_once(PLIST_OPEN)
        .and_then(|(_, rest)| rest.rsplit_once(PLIST_CLOSE))
        .map(|(body, _)| body)
        .context("unexpected property list envelope")?;
    Ok(strip_layout(body))
}

/// Parse a fragment produced by [`to_fragment`] (or any equivalent XML
/// element) back into a value.
///
/// # Errors
///
/// Returns an error if the fragment is not a valid property-list element.
pub fn from_fragment(fragment: &str) -> Result<plist::Value> {
    let document = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{PLIST_OPEN}{fragment}{PLIST_CLOSE}");
    plist::Value::from_reader_xml(document.as_bytes()).context("parsing property list fragment")
}

/// Parse a complete exported property-list document.
///
/// # Errors
///
/// Returns an error if `text` is not a valid property list.
pub fn parse_document(text: &str) -> Result<plist::Value> {
    plist::Value::from_reader_xml(text.as_bytes()).context("parsing exported property list")
}

/// Remove indentation between tags.
///
/// A whitespace run is dropped only when it sits between `>` and `<` and
/// contains a line break or tab, so whitespace-only string contents survive.
fn strip_layout(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut pending = String::new();
    let mut after_tag = false;
    for c in xml.chars() {
        if after_tag && c.is_whitespace() {
            pending.push(c);
            continue;
        }
        if !pending.is_empty() {
            let layout = c == '<' && pending.contains(['\n', '\r', '\t']);
            if !layout {
                out.push_str(&pending);
            }
            pending.clear();
        }
        out.push(c);
        after_tag = c == '>';
    }
    let trailing_layout = pending.contains(['\n', '\r', '\t']);
    if !trailing_layout {
        out.push_str(&pending);
    }
    out.trim_start().to_string()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn date_format() -> PrefValue {
        PrefValue::Map(BTreeMap::from([(
            "1".to_string(),
            PrefValue::String("y-MM-dd".to_string()),
        )]))
    }

    #[test]
    fn scalar_type_tags() {
        assert_eq!(Scalar::from("x").type_tag(), "-string");
        assert_eq!(Scalar::from(3).type_tag(), "-int");
        assert_eq!(Scalar::from(true).type_tag(), "-bool");
    }

    #[test]
    fn boolean_canonical_and_literal_forms() {
        assert_eq!(Scalar::Boolean(true).canonical(), "1");
        assert_eq!(Scalar::Boolean(false).canonical(), "0");
        assert_eq!(Scalar::Boolean(true).literal(), "true");
        assert_eq!(Scalar::Boolean(false).literal(), "false");
    }

    #[test]
    fn non_boolean_canonical_is_literal() {
        assert_eq!(Scalar::Integer(-2).canonical(), "-2");
        assert_eq!(Scalar::String("left".into()).canonical(), "left");
    }

    #[test]
    fn mapping_fragment_is_single_line() {
        let xml = to_fragment(&date_format().to_plist()).unwrap();
        assert_eq!(xml, "<dict><key>1</key><string>y-MM-dd</string></dict>");
    }

    #[test]
    fn fragment_round_trip_is_structural() {
        let value = date_format().to_plist();
        let xml = to_fragment(&value).unwrap();
        assert_eq!(from_fragment(&xml).unwrap(), value);
    }

    #[test]
    fn whitespace_between_tags_is_insignificant() {
        let spaced = "<dict>\n\t<key>1</key>\n\t<string>y-MM-dd</string>\n</dict>";
        assert_eq!(
            from_fragment(spaced).unwrap(),
            from_fragment("<dict><key>1</key><string>y-MM-dd</string></dict>").unwrap()
        );
    }

    #[test]
    fn whitespace_only_string_survives() {
        let value = PrefValue::List(vec![PrefValue::String(" ".to_string())]).to_plist();
        let xml = to_fragment(&value).unwrap();
        assert!(xml.contains("<string> </string>"), "got: {xml}");
        assert_eq!(from_fragment(&xml).unwrap(), value);
    }

    #[test]
    fn nested_list_fragment() {
        let value = PrefValue::List(vec![
            PrefValue::Integer(1),
            PrefValue::Boolean(false),
            date_format(),
        ])
        .to_plist();
        let xml = to_fragment(&value).unwrap();
        assert!(!xml.contains('\n'));
        assert!(xml.starts_with("<array>"));
        assert_eq!(from_fragment(&xml).unwrap(), value);
    }

    #[test]
    fn pref_value_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            a: PrefValue,
            b: PrefValue,
            c: PrefValue,
            d: PrefValue,
            e: PrefValue,
        }
        let doc: Doc = toml::from_str(
            "a = true\nb = 42\nc = \"text\"\nd = [1, 2]\ne = { 1 = \"y-MM-dd\" }\n",
        )
        .unwrap();
        assert_eq!(doc.a, PrefValue::Boolean(true));
        assert_eq!(doc.b, PrefValue::Integer(42));
        assert_eq!(doc.c, PrefValue::String("text".into()));
        assert_eq!(
            doc.d,
            PrefValue::List(vec![PrefValue::Integer(1), PrefValue::Integer(2)])
        );
        assert_eq!(doc.e, date_format());
    }

    #[test]
    fn as_scalar_only_for_scalars() {
        assert_eq!(PrefValue::Integer(1).as_scalar(), Some(Scalar::Integer(1)));
        assert!(date_format().as_scalar().is_none());
    }

    #[test]
    fn parse_exported_document() {
        let doc = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n<plist version=\"1.0\">\n<dict>\n\t<key>autohide</key>\n\t<true/>\n</dict>\n</plist>\n";
        let value = parse_document(doc).unwrap();
        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.get("autohide"), Some(&plist::Value::Boolean(true)));
    }
}
