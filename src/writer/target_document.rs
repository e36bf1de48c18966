use crate::config::{has_xlsx_extension, WriteConfig};
use crate::error::{Result, SheetMergeError};
use crate::extractor::{CellValue, RowPair};
use calamine::{open_workbook, Reader, Xlsx};
use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet, XlsxError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Columns owned by the merge; every other column is carried over untouched.
const MERGE_COLUMNS: [u16; 2] = [0, 1];

#[derive(Debug, Clone, PartialEq)]
pub enum StoredCell {
    Value(CellValue),
    Formula { formula: String, cached: CellValue },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetContents {
    pub name: String,
    cells: BTreeMap<(u32, u16), StoredCell>,
}

impl SheetContents {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    /// 0-based index of the last populated row, if any.
    pub fn max_row(&self) -> Option<u32> {
        self.cells.keys().map(|(row, _)| *row).max()
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&StoredCell> {
        self.cells.get(&(row, col))
    }

    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        if value.is_blank() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), StoredCell::Value(value));
        }
    }
}

/// The destination workbook, held in memory until [`TargetDocument::save`].
#[derive(Debug, Clone)]
pub struct TargetDocument {
    path: PathBuf,
    existed: bool,
    sheets: Vec<SheetContents>,
}

impl TargetDocument {
    pub fn open_or_create<P: AsRef<Path>>(path: P, config: &WriteConfig) -> Result<Self> {
        let path = path.as_ref();

        if !has_xlsx_extension(path) {
            return Err(SheetMergeError::target_write(
                path,
                "target must be an .xlsx workbook",
            ));
        }

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self {
                path: path.to_path_buf(),
                existed: false,
                sheets: vec![SheetContents::new(config.new_sheet_name.clone())],
            })
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let mut workbook: Xlsx<_> =
            open_workbook(path).map_err(|e| SheetMergeError::target_write(path, e))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let mut sheet = SheetContents::new(name.clone());

            let values = workbook
                .worksheet_range(&name)
                .map_err(|e| SheetMergeError::target_write(path, format!("sheet '{}': {}", name, e)))?;
            let (row_offset, col_offset) = values.start().unwrap_or((0, 0));
            for (row, col, value) in values.used_cells() {
                let key = (row_offset + row as u32, (col_offset as usize + col) as u16);
                sheet.cells.insert(key, StoredCell::Value(CellValue::from(value)));
            }

            let formulas = workbook
                .worksheet_formula(&name)
                .map_err(|e| SheetMergeError::target_write(path, format!("sheet '{}': {}", name, e)))?;
            let (row_offset, col_offset) = formulas.start().unwrap_or((0, 0));
            for (row, col, formula) in formulas.used_cells() {
                let key = (row_offset + row as u32, (col_offset as usize + col) as u16);
                let cached = match sheet.cells.remove(&key) {
                    Some(StoredCell::Value(value)) => value,
                    _ => CellValue::Empty,
                };
                sheet.cells.insert(
                    key,
                    StoredCell::Formula {
                        formula: formula.clone(),
                        cached,
                    },
                );
            }

            sheets.push(sheet);
        }

        if sheets.is_empty() {
            return Err(SheetMergeError::target_write(path, "workbook has no worksheet"));
        }

        Ok(Self {
            path: path.to_path_buf(),
            existed: true,
            sheets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn existed(&self) -> bool {
        self.existed
    }

    pub fn sheets(&self) -> &[SheetContents] {
        &self.sheets
    }

    pub fn first_sheet(&self) -> &SheetContents {
        &self.sheets[0]
    }

    /// Blanks columns A and B up to the current last row, then writes `rows`
    /// from row 1. Returns how many rows were cleared.
    pub fn overwrite_columns(&mut self, rows: &[RowPair]) -> u32 {
        let sheet = &mut self.sheets[0];

        let cleared = match sheet.max_row() {
            Some(max_row) => {
                for row in 0..=max_row {
                    for col in MERGE_COLUMNS {
                        sheet.cells.remove(&(row, col));
                    }
                }
                max_row + 1
            }
            None => 0,
        };

        for (index, pair) in rows.iter().enumerate() {
            let row = index as u32;
            sheet.set(row, MERGE_COLUMNS[0], pair.a.clone());
            sheet.set(row, MERGE_COLUMNS[1], pair.b.clone());
        }

        cleared
    }

    /// Serializes every sheet and replaces the file at the target path in one step.
    pub fn save(&self, config: &WriteConfig) -> Result<()> {
        let buffer = self
            .to_workbook(config)
            .and_then(|mut workbook| workbook.save_to_buffer())
            .map_err(|e| SheetMergeError::target_write(&self.path, e))?;

        super::persist_atomically(&self.path, &buffer)
    }

    fn to_workbook(&self, config: &WriteConfig) -> std::result::Result<Workbook, XlsxError> {
        let formats = CellFormats::new(config);
        let mut workbook = Workbook::new();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (&(row, col), cell) in &sheet.cells {
                write_cell(worksheet, row, col, cell, &formats)?;
            }
        }

        Ok(workbook)
    }
}

struct CellFormats {
    date: Format,
    datetime: Format,
    duration: Format,
}

impl CellFormats {
    fn new(config: &WriteConfig) -> Self {
        Self {
            date: Format::new().set_num_format(&config.date_format),
            datetime: Format::new().set_num_format(&config.datetime_format),
            duration: Format::new().set_num_format(&config.duration_format),
        }
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &StoredCell,
    formats: &CellFormats,
) -> std::result::Result<(), XlsxError> {
    match cell {
        StoredCell::Value(value) => write_value(worksheet, row, col, value, formats),
        StoredCell::Formula { formula, cached } => {
            let mut formula = Formula::new(formula);
            if !cached.is_blank() {
                formula = formula.set_result(cached.to_string());
            }
            worksheet.write_formula(row, col, formula)?;
            Ok(())
        }
    }
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    formats: &CellFormats,
) -> std::result::Result<(), XlsxError> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(s) if s.is_empty() => {}
        CellValue::Text(s) | CellValue::Error(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Int(v) => {
            worksheet.write_number(row, col, *v as f64)?;
        }
        CellValue::Float(v) => {
            worksheet.write_number(row, col, *v)?;
        }
        CellValue::Bool(v) => {
            worksheet.write_boolean(row, col, *v)?;
        }
        CellValue::DateTime(serial) => {
            let format = if serial.fract() == 0.0 {
                &formats.date
            } else {
                &formats.datetime
            };
            worksheet.write_number_with_format(row, col, *serial, format)?;
        }
        CellValue::Duration(serial) => {
            worksheet.write_number_with_format(row, col, *serial, &formats.duration)?;
        }
    }
    Ok(())
}
