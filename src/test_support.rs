//! Workbook fixtures shared by the unit tests.

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub enum Fixture {
    Text(&'static str),
    Number(f64),
    Date(f64),
    Bool(bool),
    Blank,
}

pub fn write_workbook(path: &Path, rows: &[&[Fixture]]) {
    write_workbook_sheets(path, &[("Sheet1", rows)]);
}

pub fn write_workbook_sheets(path: &Path, sheets: &[(&str, &[&[Fixture]])]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();

        for (row, cells) in rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let (row, col) = (row as u32, col as u16);
                match cell {
                    Fixture::Text(s) => {
                        worksheet.write_string(row, col, *s).unwrap();
                    }
                    Fixture::Number(n) => {
                        worksheet.write_number(row, col, *n).unwrap();
                    }
                    Fixture::Date(serial) => {
                        worksheet
                            .write_number_with_format(row, col, *serial, &date_format)
                            .unwrap();
                    }
                    Fixture::Bool(b) => {
                        worksheet.write_boolean(row, col, *b).unwrap();
                    }
                    Fixture::Blank => {}
                }
            }
        }
    }

    workbook.save(path).unwrap();
}

pub fn read_sheet(path: &Path, index: usize) -> Range<Data> {
    let mut workbook = open_workbook_auto(path).unwrap();
    workbook.worksheet_range_at(index).unwrap().unwrap()
}

pub fn cell(range: &Range<Data>, row: u32, col: u32) -> Data {
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}
