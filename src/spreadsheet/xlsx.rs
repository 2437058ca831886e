use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::WorkbookError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use zip::ZipArchive;

// XML tag names of the workbook parts
const TAG_RELATIONSHIP: &[u8] = b"Relationship";         // Package relationship
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");     // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");       // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");     // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");            // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");      // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");          // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                     // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");                // Worksheet definition
const TAG_ROW: QName = QName(b"row");                    // Row in worksheet
const TAG_CELL: QName = QName(b"c");                     // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");           // Inline string value
const TAG_VALUE: QName = QName(b"v");                    // Cell value content

const PART_WORKBOOK: &str = "xl/workbook.xml";
const PART_WORKBOOK_RELATIONSHIPS: &str = "xl/_rels/workbook.xml.rels";
const PART_STYLES: &str = "xl/styles.xml";
const PART_SHARED_STRINGS: &str = "xl/sharedStrings.xml";

/// An opened `.xlsx` workbook.
pub(crate) struct Workbook {
    /// File name of the workbook
    pub(crate) name: String,
    /// ZIP package holding the workbook parts
    zip: ZipArchive<BufReader<File>>,
    /// Cell type per style index, used to recognise dates and times
    number_formats: Vec<CellType>,
    /// Worksheets as (name, part path) pairs in workbook order
    sheets: Vec<(String, String)>,
    /// Shared string table
    shared_strings: Vec<String>,
}

impl Workbook {
    /// Opens a workbook and reads its sheet list, styles and shared strings.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not a ZIP package, lacks the
    /// workbook part, contains broken XML or has no worksheets.
    pub(crate) fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, WorkbookError> {
        let name = path.as_ref().display().to_string();
        let file = File::open(path.as_ref())?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(WorkbookError::NoSheets)?
        }
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        let shared_strings = load_shared_strings(&mut zip)?;
        log::debug!(
            "Opened workbook '{}': {} sheets, {} shared strings, 1904 dates: {}",
            name,
            sheets.len(),
            shared_strings.len(),
            is_1904
        );
        Ok(Workbook {
            name,
            zip,
            number_formats,
            sheets,
            shared_strings,
        })
    }

    /// Returns the sheet names in workbook order.
    pub(crate) fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub(crate) fn shared_strings(&self) -> &[String] {
        &self.shared_strings
    }

    /// Reads every non-empty cell of the named worksheet.
    /// Cells holding error values (`#N/A`, `#DIV/0!` ...) are treated as empty.
    pub(crate) fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, WorkbookError> {
        let zip_path = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.to_owned())
            .ok_or_else(|| WorkbookError::SheetNotFound(sheet_name.to_owned()))?;

        let mut sheet = Sheet::new(sheet_name);
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut reader = self
            .zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| WorkbookError::MissingPart(zip_path.to_owned()))?;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.get_attribute_value("r")? {
                    row_count = number.parse::<usize>()?.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
                col_count = 0;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                value.clear();
                kind = match event.get_attribute_value("t")?.as_deref() {
                    Some("inlineStr") | Some("str") => CellType::InlineString,
                    Some("s") => CellType::SharedString,
                    Some("d") => CellType::IsoDateTime,
                    Some("b") => CellType::Boolean,
                    Some("e") => CellType::Error,
                    _ => CellType::Number,
                };
                if kind == CellType::Number {
                    if let Some(format_id) = event.get_attribute_value("s")? {
                        if !format_id.is_empty() {
                            let index = format_id.parse::<usize>()?;
                            kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                        }
                    }
                }
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if kind != CellType::Empty && kind != CellType::Error && !value.is_empty() {
                    sheet.push(Cell {
                        row,
                        col,
                        kind,
                        value: std::mem::take(&mut value),
                    });
                }
                kind = CellType::Empty;
            }
        });
        log::debug!("Read sheet '{}' from '{}': {} cells", sheet_name, self.name, sheet.cells.len());
        Ok(sheet)
    }
}

/// Loads the worksheet list from `workbook.xml` and its relationships, plus the
/// date system flag (`date1904`).
fn load_workbook<R: std::io::Read + std::io::Seek>(
    zip: &mut ZipArchive<R>,
) -> Result<(Vec<(String, String)>, bool), WorkbookError> {
    let relationships = load_relationships(zip, PART_WORKBOOK_RELATIONSHIPS)?;
    let mut reader = zip
        .xml_reader(PART_WORKBOOK)?
        .ok_or_else(|| WorkbookError::MissingPart(PART_WORKBOOK.to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let name = event.get_attribute_value("name")?;
            let id = event.get_local_attribute_value("id")?;
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&*id) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Maps worksheet relationship ids to part paths.
fn load_relationships<R: std::io::Read + std::io::Seek>(
    zip: &mut ZipArchive<R>,
    path: &str,
) -> Result<HashMap<String, String>, WorkbookError> {
    let mut reader = zip
        .xml_reader(path)?
        .ok_or_else(|| WorkbookError::MissingPart(path.to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Normalizes a relationship target to a path inside the package.
fn to_zip_path(path: &str) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Loads cell types per style index from `styles.xml`.
/// A workbook without styles treats every number as a plain number.
fn load_number_formats<R: std::io::Read + std::io::Seek>(
    zip: &mut ZipArchive<R>,
    is_1904: bool,
) -> Result<Vec<CellType>, WorkbookError> {
    let mut reader = match zip.xml_reader(PART_STYLES)? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_default());
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect())
}

/// Loads the shared string table; a workbook without one has no shared strings.
fn load_shared_strings<R: std::io::Read + std::io::Seek>(
    zip: &mut ZipArchive<R>,
) -> Result<Vec<String>, WorkbookError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader(PART_SHARED_STRINGS)? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Reads string content up to `end_tag`, concatenating rich text runs and
/// skipping phonetic annotations. With `is_text_content` the element itself
/// holds the text (`<v>`), otherwise only `<t>` children count.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, WorkbookError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
