use std::borrow::Cow;

use quick_xml::encoding::Decoder;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{CompileError, Error};
use crate::node::{Attr, Node, Span};

/// Parses markup into an element tree rooted at the first top-level element.
///
/// Comments, processing instructions, declarations and doctypes are skipped.
/// Entity and character references are resolved, CDATA sections are kept as
/// plain text, and namespace prefixes are dropped from tag and attribute names.
pub fn parse(source: &str) -> Result<Node, Error> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().expand_empty_elements = true;
    reader.config_mut().check_end_names = true;
    let decoder = reader.decoder();

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            let position = reader.error_position() as usize;
            parse_error(e.to_string(), Span::new(position, position + 1))
        })?;
        let span = Span::new(start, reader.buffer_position() as usize);

        match event {
            Event::Start(e) => {
                if let Some(root) = &root {
                    return Err(parse_error(
                        format!("unexpected element after the root element <{}>", root.tag),
                        span,
                    ));
                }

                let span = Span::new(markup_start(source, span.start), span.end);
                stack.push(start_node(&e, decoder, span)?);
            }
            Event::End(_) => {
                let Some(mut node) = stack.pop() else {
                    return Err(parse_error("unexpected closing tag", span));
                };

                if let Some(node_span) = node.span.as_mut() {
                    node_span.end = span.end;
                }

                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Event::Text(e) => {
                let text = decode(decoder, &e, span)?;
                let text = unescape(&text).map_err(|e| parse_error(e.to_string(), span))?;
                push_text(&mut stack, &text, span)?;
            }
            Event::CData(e) => {
                let text = decode(decoder, &e, span)?;
                push_text(&mut stack, &text, span)?;
            }
            Event::GeneralRef(e) => {
                let reference = format!("&{};", decode(decoder, &e, span)?);
                let text = unescape(&reference).map_err(|e| parse_error(e.to_string(), span))?;
                push_text(&mut stack, &text, span)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        let position = source.len();
        return Err(parse_error(
            format!("unclosed element <{}>", open.tag),
            open.span.unwrap_or(Span::new(position, position)),
        ));
    }

    root.ok_or_else(|| parse_error("no root element found", Span::new(0, 0)))
}

fn start_node(e: &BytesStart<'_>, decoder: Decoder, span: Span) -> Result<Node, Error> {
    let local_name = e.local_name();
    let tag = decode(decoder, local_name.as_ref(), span)?;
    let mut node = Node::element(tag.as_ref()).with_span(span);

    let mut attributes = e.attributes();
    attributes.with_checks(false);

    for attr in attributes {
        let attr = attr.map_err(|e| parse_error(e.to_string(), span))?;
        let key = attr.key.local_name();
        let name = decode(decoder, key.as_ref(), span)?;
        let raw_value = decode(decoder, &attr.value, span)?;
        let value = unescape(&raw_value).map_err(|e| parse_error(e.to_string(), span))?;
        node.attrs.push(Attr::new(name.as_ref(), value.into_owned()));
    }

    Ok(node)
}

fn push_text(stack: &mut [Node], text: &str, span: Span) -> Result<(), Error> {
    let Some(parent) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }

        return Err(parse_error(
            format!("unexpected text outside the root element: {}", text.trim()),
            span,
        ));
    };

    parent.text.push_str(text);

    match parent.children.last_mut() {
        Some(last) if last.is_text() => {
            last.text.push_str(text);
            if let Some(last_span) = last.span.as_mut() {
                last_span.end = span.end;
            }
        }
        _ => parent.children.push(Node::text(text).with_span(span)),
    }

    Ok(())
}

/// Depending on the preceding event the reader may already have consumed the
/// `<` that opens the next tag.
fn markup_start(source: &str, position: usize) -> usize {
    let bytes = source.as_bytes();

    match position.checked_sub(1) {
        Some(prev) if bytes.get(position) != Some(&b'<') && bytes.get(prev) == Some(&b'<') => prev,
        _ => position,
    }
}

fn decode<'b>(decoder: Decoder, bytes: &'b [u8], span: Span) -> Result<Cow<'b, str>, Error> {
    decoder
        .decode(bytes)
        .map_err(|e| parse_error(e.to_string(), span))
}

fn parse_error(message: impl Into<String>, span: Span) -> Error {
    Error::new(CompileError::Parse(message.into())).with_span(Some(span))
}
