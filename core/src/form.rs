//! Form payloads: `FormData` plus the two wire encodings it travels in.
//!
//! # Design
//! `FormData` is an ordered list of named entries, each either a text value
//! or a file (a `Blob` with a filename). Outgoing form bodies are encoded as
//! `multipart/form-data` with a random boundary; incoming bodies are parsed
//! from either `multipart/form-data` or `application/x-www-form-urlencoded`.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::blob::Blob;
use crate::error::FetchError;

/// A single form entry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File { blob: Blob, filename: String },
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_string(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, name: &str, blob: Blob, filename: &str) {
        self.entries.push((
            name.to_string(),
            FormValue::File {
                blob,
                filename: filename.to_string(),
            },
        ));
    }

    /// Replace every entry named `name` with a single text entry, keeping
    /// the position of the first one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = FormValue::Text(value.into());
        match self.entries.iter().position(|(n, _)| n == name) {
            Some(first) => {
                self.entries[first].1 = value;
                let mut index = 0;
                self.entries.retain(|(n, _)| {
                    let keep = index <= first || n != name;
                    index += 1;
                    keep
                });
            }
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_all(&self, name: &str) -> Vec<&FormValue> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn delete(&mut self, name: &str) {
        self.entries.retain(|(n, _)| n != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as `multipart/form-data`, returning the payload and the
    /// boundary-bearing Content-Type.
    pub(crate) fn to_multipart(&self) -> (Bytes, String) {
        let boundary = format!("----FetchFormBoundary{}", Uuid::new_v4().simple());
        let body = self.encode_multipart(&boundary);
        (body, format!("multipart/form-data; boundary={boundary}"))
    }

    pub(crate) fn encode_multipart(&self, boundary: &str) -> Bytes {
        let mut out = BytesMut::new();
        for (name, value) in &self.entries {
            out.put_slice(format!("--{boundary}\r\n").as_bytes());
            match value {
                FormValue::Text(text) => {
                    out.put_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            escape_field(name)
                        )
                        .as_bytes(),
                    );
                    out.put_slice(text.as_bytes());
                }
                FormValue::File { blob, filename } => {
                    let content_type = match blob.content_type() {
                        "" => "application/octet-stream",
                        t => t,
                    };
                    out.put_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n",
                            escape_field(name),
                            escape_field(filename)
                        )
                        .as_bytes(),
                    );
                    out.put_slice(blob.as_bytes());
                }
            }
            out.put_slice(b"\r\n");
        }
        out.put_slice(format!("--{boundary}--\r\n").as_bytes());
        out.freeze()
    }

    /// Parse an `application/x-www-form-urlencoded` payload.
    pub(crate) fn parse_urlencoded(payload: &[u8]) -> FormData {
        let mut form = FormData::new();
        for (name, value) in form_urlencoded::parse(payload) {
            form.append(&name, value);
        }
        form
    }

    /// Parse a `multipart/form-data` payload delimited by `boundary`.
    pub(crate) fn parse_multipart(payload: &[u8], boundary: &str) -> Result<FormData, FetchError> {
        let delimiter = format!("--{boundary}");
        let delimiter = delimiter.as_bytes();

        let start = find(payload, delimiter)
            .ok_or_else(|| FetchError::MalformedForm("missing opening boundary".to_string()))?;
        let mut rest = &payload[start + delimiter.len()..];
        let mut form = FormData::new();

        loop {
            if rest.starts_with(b"--") {
                return Ok(form);
            }
            rest = strip_line_break(rest)
                .ok_or_else(|| FetchError::MalformedForm("expected line break after boundary".to_string()))?;

            let end = find(rest, delimiter)
                .ok_or_else(|| FetchError::MalformedForm("missing closing boundary".to_string()))?;
            let part = &rest[..end];
            let part = part
                .strip_suffix(b"\r\n")
                .or_else(|| part.strip_suffix(b"\n"))
                .unwrap_or(part);
            let (name, value) = parse_part(part)?;
            form.entries.push((name, value));
            rest = &rest[end + delimiter.len()..];
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (name, value) in iter {
            form.append(name.as_ref(), value);
        }
        form
    }
}

/// Split a part into its headers and content, and build the entry.
fn parse_part(part: &[u8]) -> Result<(String, FormValue), FetchError> {
    let (head, content) = match find(part, b"\r\n\r\n") {
        Some(i) => (&part[..i], &part[i + 4..]),
        None => match find(part, b"\n\n") {
            Some(i) => (&part[..i], &part[i + 2..]),
            None => return Err(FetchError::MalformedForm("part without header terminator".to_string())),
        },
    };
    let head = String::from_utf8_lossy(head);

    let mut name = None;
    let mut filename = None;
    let mut content_type = String::new();
    for line in head.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            let params = disposition_params(value);
            name = param(&params, "name");
            filename = param(&params, "filename");
        } else if key.eq_ignore_ascii_case("content-type") {
            content_type = value.trim().to_string();
        }
    }

    let name = name.ok_or_else(|| FetchError::MalformedForm("part without a name".to_string()))?;
    let value = match filename {
        Some(filename) => FormValue::File {
            blob: Blob::new(Bytes::copy_from_slice(content), &content_type),
            filename,
        },
        None => FormValue::Text(String::from_utf8_lossy(content).into_owned()),
    };
    Ok((name, value))
}

/// Parameters of a Content-Disposition value such as
/// `form-data; name="field"; filename="a.txt"`, with lowercase keys.
///
/// Quoted values may contain `;` and `=`; `\"` and `\\` are unescaped inside
/// them.
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let Some((_, mut rest)) = split_unquoted(value) else {
        return params;
    };
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return params;
        }
        let Some(eq) = rest.find(['=', ';']).filter(|&i| rest.as_bytes()[i] == b'=') else {
            // a bare flag without a value
            match split_unquoted(rest) {
                Some((_, tail)) => {
                    rest = tail;
                    continue;
                }
                None => return params,
            }
        };
        let key = rest[..eq].trim().to_ascii_lowercase();
        let after = rest[eq + 1..].trim_start();
        let (value, tail) = match after.strip_prefix('"') {
            Some(quoted) => read_quoted(quoted),
            None => {
                let end = after.find(';').unwrap_or(after.len());
                (after[..end].trim().to_string(), &after[end..])
            }
        };
        params.push((key, unescape_field(&value)));
        rest = match split_unquoted(tail) {
            Some((_, next)) => next,
            None => return params,
        };
    }
}

/// Split at the first `;` that is not inside a quoted string.
fn split_unquoted(input: &str) -> Option<(&str, &str)> {
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => return Some((&input[..i], &input[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Read a quoted string whose opening quote is already consumed. Returns
/// the unescaped content and whatever follows the closing quote.
fn read_quoted(input: &str) -> (String, &str) {
    let mut out = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return (out, &input[i + 1..]),
            '\\' => match chars.peek() {
                Some(&(_, next @ ('"' | '\\'))) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            },
            c => out.push(c),
        }
    }
    (out, "")
}

fn param(params: &[(String, String)], key: &str) -> Option<String> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

fn escape_field(value: &str) -> String {
    value
        .replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace('"', "%22")
}

fn unescape_field(value: &str) -> String {
    value
        .replace("%0D", "\r")
        .replace("%0A", "\n")
        .replace("%22", "\"")
}

fn strip_line_break(input: &[u8]) -> Option<&[u8]> {
    input
        .strip_prefix(b"\r\n")
        .or_else(|| input.strip_prefix(b"\n"))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_all_entries_in_place() {
        let mut form = FormData::new();
        form.append("a", "1");
        form.append("b", "2");
        form.append("a", "3");
        form.set("a", "4");
        let entries: Vec<(&str, &FormValue)> = form.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "a");
        assert_eq!(entries[0].1.as_text(), Some("4"));
        assert_eq!(entries[1].0, "b");
    }

    #[test]
    fn delete_and_get_all() {
        let mut form: FormData = [("x", "1"), ("x", "2"), ("y", "3")].into_iter().collect();
        assert_eq!(form.get_all("x").len(), 2);
        form.delete("x");
        assert!(!form.has("x"));
        assert_eq!(form.get("y").and_then(FormValue::as_text), Some("3"));
    }

    #[test]
    fn parses_urlencoded_payload() {
        let form = FormData::parse_urlencoded(b"number=1&space=one+two&empty=&encoded=a%2Bb&");
        assert_eq!(form.get("number").and_then(FormValue::as_text), Some("1"));
        assert_eq!(form.get("space").and_then(FormValue::as_text), Some("one two"));
        assert_eq!(form.get("empty").and_then(FormValue::as_text), Some(""));
        assert_eq!(form.get("encoded").and_then(FormValue::as_text), Some("a+b"));
        assert_eq!(form.len(), 4);
    }

    #[test]
    fn multipart_encoding_is_readable_back() {
        let mut form = FormData::new();
        form.append("name", "Hubot");
        form.append_file("avatar", Blob::new("PNG", "image/png"), "a \"b\".png");

        let (payload, content_type) = form.to_multipart();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let parsed_type: mime::Mime = content_type.parse().unwrap();
        let boundary = parsed_type.get_param(mime::BOUNDARY).unwrap().as_str().to_string();

        let parsed = FormData::parse_multipart(&payload, &boundary).unwrap();
        assert_eq!(parsed.get("name").and_then(FormValue::as_text), Some("Hubot"));
        match parsed.get("avatar") {
            Some(FormValue::File { blob, filename }) => {
                assert_eq!(filename, "a \"b\".png");
                assert_eq!(blob.content_type(), "image/png");
                assert_eq!(blob.text(), "PNG");
            }
            other => panic!("expected a file entry, got {other:?}"),
        }
    }

    #[test]
    fn empty_form_encodes_to_closing_boundary_only() {
        let payload = FormData::new().encode_multipart("xyz");
        assert_eq!(&payload[..], b"--xyz--\r\n");
        assert!(FormData::parse_multipart(&payload, "xyz").unwrap().is_empty());
    }

    #[test]
    fn rejects_multipart_without_boundary() {
        let err = FormData::parse_multipart(b"name=value", "xyz").unwrap_err();
        assert!(matches!(err, FetchError::MalformedForm(_)));
    }

    #[test]
    fn disposition_params_honour_quotes() {
        let params = disposition_params(r#"form-data; name="a;b"; filename="x=1; y.txt""#);
        assert_eq!(param(&params, "name").as_deref(), Some("a;b"));
        assert_eq!(param(&params, "filename").as_deref(), Some("x=1; y.txt"));

        let params = disposition_params(r#"form-data; NAME=plain ; flag; other="say \"hi\"""#);
        assert_eq!(param(&params, "name").as_deref(), Some("plain"));
        assert_eq!(param(&params, "other").as_deref(), Some("say \"hi\""));
        assert!(disposition_params("form-data").is_empty());
    }

    #[test]
    fn quoted_field_name_with_semicolon() {
        let payload = b"--xyz\r\n\
            Content-Disposition: form-data; name=\"a;b\"\r\n\r\n\
            1\r\n\
            --xyz--\r\n";
        let form = FormData::parse_multipart(payload, "xyz").unwrap();
        assert_eq!(form.len(), 1);
        assert_eq!(form.get("a;b").and_then(FormValue::as_text), Some("1"));
    }
}
