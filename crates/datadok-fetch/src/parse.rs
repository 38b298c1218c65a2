//! Parsing of Datadok file descriptions.
//!
//! Datadok answers with an XML document roughly shaped like:
//!
//! ```text
//! <FileDescription xmlns="http://www.ssb.no/ns/meta">
//!   <ContactInformation><Division>S320</Division></ContactInformation>
//!   <ContextVariable id="urn:...">
//!     <Title>KJONN</Title>
//!     <Description>Kjønn</Description>
//!     <Properties>
//!       <Datatype>Tekst</Datatype><Length>1</Length>
//!       <StartPosition>12</StartPosition><Precision/>
//!     </Properties>
//!     <Codelist>
//!       <CodelistMeta><Title>Kjønn</Title><Description>...</Description></CodelistMeta>
//!       <Codes><Code><CodeValue>1</CodeValue><CodeText>Mann</CodeText></Code></Codes>
//!     </Codelist>
//!   </ContextVariable>
//! </FileDescription>
//! ```
//!
//! Elements are matched on local names and their position in the tree, so
//! `ContextVariable/Title` and `Codelist/CodelistMeta/Title` stay distinct
//! regardless of namespace prefixes.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use datadok_model::{ArchiveError, ArchiveMetadata, CodelistEntry, FieldDescriptor, Result};

/// Parses a metadata document, detecting XML or JSON from its first character.
pub fn parse_metadata(text: &str, source_name: &str) -> Result<ArchiveMetadata> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    match trimmed.chars().next() {
        Some('<') => parse_metadata_xml(trimmed, source_name),
        Some('{') => parse_metadata_json(trimmed, source_name),
        Some(_) => Err(ArchiveError::metadata_unavailable(
            source_name,
            "response is neither XML nor JSON",
        )),
        None => Err(ArchiveError::metadata_unavailable(
            source_name,
            "empty response",
        )),
    }
}

/// Parses a JSON metadata document.
pub fn parse_metadata_json(text: &str, source_name: &str) -> Result<ArchiveMetadata> {
    let metadata: ArchiveMetadata = serde_json::from_str(text).map_err(|e| {
        ArchiveError::metadata_unavailable(source_name, format!("invalid JSON: {e}"))
    })?;
    if metadata.is_empty() {
        return Err(ArchiveError::metadata_unavailable(
            source_name,
            "document declares no fields",
        ));
    }
    Ok(metadata)
}

/// Parses a Datadok XML file description.
pub fn parse_metadata_xml(text: &str, source_name: &str) -> Result<ArchiveMetadata> {
    let mut reader = Reader::from_str(text);
    let mut parser = DescriptionParser::new(source_name);

    loop {
        let event = reader.read_event().map_err(|e| {
            ArchiveError::metadata_unavailable(
                source_name,
                format!(
                    "invalid XML at position {}: {e}",
                    reader.buffer_position()
                ),
            )
        })?;
        match event {
            Event::Start(start) => parser.open(&start),
            Event::Empty(start) => {
                parser.open(&start);
                parser.close()?;
            }
            Event::End(_) => parser.close()?,
            Event::Text(text) => parser.text.push_str(&String::from_utf8_lossy(&text)),
            Event::CData(data) => parser.text.push_str(&String::from_utf8_lossy(&data)),
            Event::GeneralRef(reference) => {
                let name = String::from_utf8_lossy(&reference).into_owned();
                match resolve_entity(&name) {
                    Some(resolved) => parser.text.push(resolved),
                    None => {
                        parser.text.push('&');
                        parser.text.push_str(&name);
                        parser.text.push(';');
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish()
}

/// Resolves the predefined XML entities and character references.
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Context variable being assembled from its child elements.
#[derive(Debug, Default)]
struct VariableBuilder {
    id: String,
    title: Option<String>,
    description: Option<String>,
    datatype: Option<String>,
    length: Option<String>,
    start_position: Option<String>,
    precision: Option<String>,
    codelist_title: Option<String>,
    codelist_description: Option<String>,
    codes: Vec<(String, String)>,
    code_value: Option<String>,
    code_text: Option<String>,
}

struct DescriptionParser<'a> {
    source_name: &'a str,
    stack: Vec<String>,
    text: String,
    division: Option<String>,
    current: Option<VariableBuilder>,
    fields: Vec<FieldDescriptor>,
    codelists: Vec<CodelistEntry>,
}

impl<'a> DescriptionParser<'a> {
    fn new(source_name: &'a str) -> Self {
        Self {
            source_name,
            stack: Vec::new(),
            text: String::new(),
            division: None,
            current: None,
            fields: Vec::new(),
            codelists: Vec::new(),
        }
    }

    fn open(&mut self, start: &BytesStart<'_>) {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        self.text.clear();
        match name.as_str() {
            "ContextVariable" => {
                let id = start
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.local_name().as_ref() == b"id")
                    .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
                    .unwrap_or_default();
                self.current = Some(VariableBuilder {
                    id,
                    ..VariableBuilder::default()
                });
            }
            "Code" => {
                if let Some(builder) = self.current.as_mut() {
                    builder.code_value = None;
                    builder.code_text = None;
                }
            }
            _ => {}
        }
        self.stack.push(name);
    }

    fn close(&mut self) -> Result<()> {
        let Some(name) = self.stack.pop() else {
            return Ok(());
        };
        let value = non_empty(&self.text);
        self.text.clear();
        let parent = self.stack.last().map(String::as_str);

        if name == "Division" && parent == Some("ContactInformation") {
            self.division = value;
            return Ok(());
        }

        if name == "ContextVariable" {
            if let Some(builder) = self.current.take() {
                self.finish_variable(builder)?;
            }
            return Ok(());
        }

        let in_codelist = self.stack.iter().any(|element| element == "Codelist");
        let Some(builder) = self.current.as_mut() else {
            return Ok(());
        };

        if in_codelist {
            match (name.as_str(), parent) {
                ("Title", Some("CodelistMeta")) => builder.codelist_title = value,
                ("Description", Some("CodelistMeta")) => builder.codelist_description = value,
                ("CodeValue", _) => builder.code_value = value,
                ("CodeText", _) => builder.code_text = value,
                ("Code", _) => {
                    if let (Some(code), Some(label)) =
                        (builder.code_value.take(), builder.code_text.take())
                    {
                        builder.codes.push((code, label));
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        match (name.as_str(), parent) {
            ("Title", Some("ContextVariable")) => builder.title = value,
            ("Description", Some("ContextVariable")) => builder.description = value,
            ("Datatype", Some("Properties")) => builder.datatype = value,
            ("Length", Some("Properties")) => builder.length = value,
            ("StartPosition", Some("Properties")) => builder.start_position = value,
            ("Precision", Some("Properties")) => builder.precision = value,
            _ => {}
        }
        Ok(())
    }

    fn finish_variable(&mut self, builder: VariableBuilder) -> Result<()> {
        let context = if builder.id.is_empty() {
            format!("ContextVariable #{}", self.fields.len() + 1)
        } else {
            format!("ContextVariable {}", builder.id)
        };
        let title = self.require(builder.title, "Title", &context)?;
        let datatype = self.require(builder.datatype, "Datatype", &context)?;
        let length = self.require(builder.length, "Length", &context)?;
        let start = self.require(builder.start_position, "StartPosition", &context)?;

        let width = self.parse_number::<usize>(&length, "Length", &context)?;
        let start = self.parse_number::<usize>(&start, "StartPosition", &context)?;

        let mut field = FieldDescriptor::new(title.clone(), start, width, datatype)
            .with_description(builder.description.unwrap_or_default());
        if let Some(precision) = builder.precision {
            field = field.with_precision(self.parse_number::<u32>(
                &precision,
                "Precision",
                &context,
            )?);
        }

        if let Some(codelist) = builder.codelist_title {
            let description = builder.codelist_description.unwrap_or_default();
            for (code, label) in builder.codes {
                self.codelists.push(
                    CodelistEntry::new(codelist.clone(), code, label)
                        .with_field(title.clone())
                        .with_description(description.clone()),
                );
            }
            field = field.with_codelist(codelist);
        } else if !builder.codes.is_empty() {
            tracing::warn!(
                field = %title,
                codes = builder.codes.len(),
                "Code list without title ignored"
            );
        }

        self.fields.push(field);
        Ok(())
    }

    fn require(&self, value: Option<String>, element: &str, context: &str) -> Result<String> {
        value.ok_or_else(|| {
            ArchiveError::metadata_unavailable(
                self.source_name,
                format!("{context}: element {element} missing or empty"),
            )
        })
    }

    fn parse_number<T: std::str::FromStr>(
        &self,
        value: &str,
        element: &str,
        context: &str,
    ) -> Result<T> {
        value.trim().parse().map_err(|_| {
            ArchiveError::metadata_unavailable(
                self.source_name,
                format!("{context}: {element} '{value}' is not a number"),
            )
        })
    }

    fn finish(self) -> Result<ArchiveMetadata> {
        if self.fields.is_empty() {
            return Err(ArchiveError::metadata_unavailable(
                self.source_name,
                "document contains no ContextVariable elements",
            ));
        }
        if self.division.is_none() {
            tracing::debug!(source = %self.source_name, "File description has no division");
        }
        tracing::debug!(
            source = %self.source_name,
            fields = self.fields.len(),
            codes = self.codelists.len(),
            "Parsed Datadok file description"
        );
        let mut metadata = ArchiveMetadata::new(self.fields, self.codelists);
        metadata.division = self.division;
        Ok(metadata)
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
