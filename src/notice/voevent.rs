//! VOEvent notice handler.
//!
//! Streams the XML with quick-xml and keeps only what downstream needs:
//! the IVORN and role of the root element, the observation time and
//! position from `WhereWhen`, and every `Param` below `What`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::notice::time::parse_timestamp;
use crate::notice::{DecodeError, Handler, MessageFormat, Notice, RawMessage, SkyPosition};

#[derive(Debug, Clone, Copy, Default)]
pub struct VoEventHandler;

impl Handler for VoEventHandler {
    fn decode(&self, message: &RawMessage) -> Result<Notice, DecodeError> {
        if message.payload.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::EmptyPayload);
        }
        let text = std::str::from_utf8(&message.payload)?;
        let mut notice = Notice::new(message.topic.clone(), MessageFormat::VoEvent);
        let fields = parse_document(text)?;

        notice.id = fields.ivorn;
        notice.alert_type = fields.role;
        notice.event_time = fields.iso_time.as_deref().and_then(parse_timestamp);
        notice.position = match (fields.c1, fields.c2) {
            (Some(ra), Some(dec)) => Some(SkyPosition {
                ra,
                dec,
                error_radius: fields.error_radius,
            }),
            _ => None,
        };
        notice.params = fields.params.into_iter().collect();
        Ok(notice)
    }
}

#[derive(Debug, Default)]
struct VoEventFields {
    ivorn: Option<String>,
    role: Option<String>,
    iso_time: Option<String>,
    c1: Option<f64>,
    c2: Option<f64>,
    error_radius: Option<f64>,
    params: Vec<(String, String)>,
}

fn xml_error(e: impl std::fmt::Display) -> DecodeError {
    DecodeError::Xml(e.to_string())
}

fn parse_document(text: &str) -> Result<VoEventFields, DecodeError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut fields = VoEventFields::default();
    let mut stack: Vec<String> = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) => {
                let name = local_name(&element);
                if !seen_root {
                    root(&element, &name, &mut fields)?;
                    seen_root = true;
                } else {
                    param(&element, &name, &stack, &mut fields)?;
                }
                stack.push(name);
            }
            Event::Empty(element) => {
                let name = local_name(&element);
                if !seen_root {
                    root(&element, &name, &mut fields)?;
                    seen_root = true;
                } else {
                    param(&element, &name, &stack, &mut fields)?;
                }
            }
            Event::Text(content) => {
                let value = content.unescape().map_err(xml_error)?;
                text_content(&stack, value.trim(), &mut fields)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(DecodeError::Malformed("document has no root element".to_string()));
    }
    if !stack.is_empty() {
        return Err(DecodeError::Malformed(format!(
            "unexpected end of document inside <{}>",
            stack.join("/")
        )));
    }
    Ok(fields)
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Result<Option<String>, DecodeError> {
    for attr in element.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned()));
        }
    }
    Ok(None)
}

fn root(element: &BytesStart<'_>, name: &str, fields: &mut VoEventFields) -> Result<(), DecodeError> {
    if name != "VOEvent" {
        return Err(DecodeError::Malformed(format!(
            "root element is <{}>, expected <VOEvent>",
            name
        )));
    }
    fields.ivorn = attribute(element, "ivorn")?;
    fields.role = attribute(element, "role")?;
    Ok(())
}

fn param(
    element: &BytesStart<'_>,
    name: &str,
    stack: &[String],
    fields: &mut VoEventFields,
) -> Result<(), DecodeError> {
    if name != "Param" || !stack.iter().any(|s| s == "What") {
        return Ok(());
    }
    if let Some(param_name) = attribute(element, "name")? {
        let value = attribute(element, "value")?.unwrap_or_default();
        fields.params.push((param_name, value));
    }
    Ok(())
}

fn text_content(stack: &[String], value: &str, fields: &mut VoEventFields) -> Result<(), DecodeError> {
    let Some(current) = stack.last() else {
        return Ok(());
    };
    if !stack.iter().any(|s| s == "WhereWhen") {
        return Ok(());
    }
    let parent = stack.len().checked_sub(2).map(|i| stack[i].as_str());

    match (current.as_str(), parent) {
        ("ISOTime", _) => fields.iso_time = Some(value.to_string()),
        ("C1", Some("Value2")) => fields.c1 = Some(number(value, "C1")?),
        ("C2", Some("Value2")) => fields.c2 = Some(number(value, "C2")?),
        ("Error2Radius", _) => fields.error_radius = Some(number(value, "Error2Radius")?),
        _ => {}
    }
    Ok(())
}

fn number(value: &str, element: &str) -> Result<f64, DecodeError> {
    value
        .parse()
        .map_err(|_| DecodeError::Malformed(format!("<{}> is not a number: '{}'", element, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const FERMI_GBM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<voe:VOEvent xmlns:voe="http://www.ivoa.net/xml/VOEvent/v2.0"
    ivorn="ivo://nasa.gsfc.gcn/Fermi#GBM_Alert_2024-01-01T12:00:00.00_725803205_1-001"
    role="observation" version="2.0">
  <Who>
    <AuthorIVORN>ivo://nasa.gsfc.tan/gcn</AuthorIVORN>
    <Date>2024-01-01T12:00:05</Date>
  </Who>
  <What>
    <Param name="Packet_Type" value="110" />
    <Param name="TrigID" value="725803205" ucd="meta.id" />
    <Group name="Trigger_ID">
      <Param name="Def_NOT_a_GRB" value="false" />
    </Group>
  </What>
  <WhereWhen>
    <ObsDataLocation>
      <ObservationLocation>
        <AstroCoords coord_system_id="UTC-FK5-GEO">
          <Time unit="s">
            <TimeInstant>
              <ISOTime>2024-01-01T12:00:00.00</ISOTime>
            </TimeInstant>
          </Time>
          <Position2D unit="deg">
            <Name1>RA</Name1>
            <Name2>Dec</Name2>
            <Value2>
              <C1>83.6331</C1>
              <C2>22.0145</C2>
            </Value2>
            <Error2Radius>3.5</Error2Radius>
          </Position2D>
        </AstroCoords>
      </ObservationLocation>
    </ObsDataLocation>
  </WhereWhen>
</voe:VOEvent>
"#;

    fn decode(payload: &str) -> Result<Notice, DecodeError> {
        VoEventHandler.decode(&RawMessage::new("gcn.classic.voevent.FERMI_GBM_ALERT", payload))
    }

    #[test]
    fn test_fermi_gbm_alert() {
        let notice = decode(FERMI_GBM).unwrap();
        assert_eq!(notice.format, MessageFormat::VoEvent);
        assert!(notice.id.as_deref().unwrap().starts_with("ivo://nasa.gsfc.gcn/Fermi#GBM_Alert"));
        assert_eq!(notice.alert_type.as_deref(), Some("observation"));
        assert_eq!(notice.event_time.unwrap().hour(), 12);

        let pos = notice.position.unwrap();
        assert_eq!((pos.ra, pos.dec, pos.error_radius), (83.6331, 22.0145, Some(3.5)));

        assert_eq!(notice.params.get("TrigID").map(String::as_str), Some("725803205"));
        assert_eq!(notice.params.get("Def_NOT_a_GRB").map(String::as_str), Some("false"));
        assert_eq!(notice.params.len(), 3);
    }

    #[test]
    fn test_minimal_event_without_location() {
        let notice = decode(r#"<VOEvent ivorn="ivo://test#1" role="test"/>"#).unwrap();
        assert_eq!(notice.id.as_deref(), Some("ivo://test#1"));
        assert_eq!(notice.alert_type.as_deref(), Some("test"));
        assert!(notice.position.is_none());
        assert!(notice.params.is_empty());
    }

    #[test]
    fn test_wrong_root_rejected() {
        let err = decode("<html><body/></html>").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_truncated_document_rejected() {
        let truncated = &FERMI_GBM[..FERMI_GBM.find("</WhereWhen>").unwrap()];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn test_mismatched_tags_rejected() {
        assert!(matches!(
            decode(r#"<VOEvent ivorn="x"><What></Who></VOEvent>"#),
            Err(DecodeError::Xml(_))
        ));
    }

    #[test]
    fn test_non_numeric_coordinate() {
        let bad = FERMI_GBM.replace("83.6331", "east");
        assert!(matches!(decode(&bad), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_empty_and_json_payloads() {
        assert!(matches!(decode("  "), Err(DecodeError::EmptyPayload)));
        assert!(decode(r#"{"ra": 1.0}"#).is_err());
    }
}
