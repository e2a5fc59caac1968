//! PROPFIND request body and multistatus parsing.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::WebDavError;

/// Depth-0 PROPFIND asking only for the properties `stat` needs.
pub(crate) const STAT_REQUEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:getcontentlength/>
    <d:getlastmodified/>
    <d:resourcetype/>
  </d:prop>
</d:propfind>"#;

/// Properties of the first resource in a multistatus body.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct StatProps {
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub is_collection: bool,
}

#[derive(Clone, Copy)]
enum Field {
    ContentLength,
    LastModified,
}

/// Parse a `207 Multi-Status` body. Only the first `response` element is read.
pub(crate) fn parse_stat(body: &str) -> Result<StatProps, WebDavError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut props = StatProps::default();
    let mut field: Option<Field> = None;
    let mut seen_response = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"response" => {
                    if seen_response {
                        break;
                    }
                    seen_response = true;
                }
                b"getcontentlength" => field = Some(Field::ContentLength),
                b"getlastmodified" => field = Some(Field::LastModified),
                b"collection" => props.is_collection = true,
                _ => field = None,
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"collection" {
                    props.is_collection = true;
                }
            }
            Ok(Event::Text(text)) => {
                let Some(current) = field else { continue };
                let value = text
                    .unescape()
                    .map_err(|e| WebDavError::InvalidResponse(e.to_string()))?;
                match current {
                    Field::ContentLength => {
                        if props.size.is_none() {
                            props.size = value.trim().parse().ok();
                        }
                    }
                    Field::LastModified => {
                        if props.last_modified.is_none() {
                            props.last_modified = DateTime::parse_from_rfc2822(value.trim())
                                .ok()
                                .map(|dt| dt.with_timezone(&Utc));
                        }
                    }
                }
            }
            Ok(Event::End(_)) => field = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(WebDavError::InvalidResponse(e.to_string())),
            _ => {}
        }
    }

    if !seen_response {
        return Err(WebDavError::InvalidResponse(
            "multistatus body has no response element".to_string(),
        ));
    }
    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_file_stat() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/Invoices/a.pdf</d:href>
    <d:propstat>
      <d:prop>
        <d:getcontentlength>1234</d:getcontentlength>
        <d:getlastmodified>Tue, 14 Jan 2025 10:20:30 GMT</d:getlastmodified>
        <d:resourcetype/>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

        let props = parse_stat(body).unwrap();
        assert_eq!(props.size, Some(1234));
        assert_eq!(
            props.last_modified,
            Some(Utc.with_ymd_and_hms(2025, 1, 14, 10, 20, 30).unwrap())
        );
        assert!(!props.is_collection);
    }

    #[test]
    fn test_parse_collection_other_prefix() {
        let body = r#"<?xml version="1.0"?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/</D:href>
    <D:propstat>
      <D:prop><D:resourcetype><D:collection/></D:resourcetype></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
    <D:propstat>
      <D:prop><D:getcontentlength/></D:prop>
      <D:status>HTTP/1.1 404 Not Found</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

        let props = parse_stat(body).unwrap();
        assert!(props.is_collection);
        assert_eq!(props.size, None);
        assert_eq!(props.last_modified, None);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_stat("<html><body>login</body></html>").is_err());
        assert!(parse_stat("<a><b></a>").is_err());
    }
}
