use std::io::Write;
use std::path::Path;

use bomkit_bom::{
    BomError, EnumExtractVariant, SpecSourceDoc, SpecStageIo, load_pipeline_config, run_compress,
    run_parse, run_pipeline,
};
use bomkit_io_xlsx::{
    EnumCellValue, SpecSheetGrid, SpecXlsxSheetWriteOptions, read_sheet, write_grid_to_file,
};
use zip::write::SimpleFileOptions;

fn cell(text: &str) -> String {
    format!(r#"<w:tc><w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p></w:tc>"#)
}

fn table_xml(rows: &[[&str; 7]]) -> String {
    let c_rows: String = rows
        .iter()
        .map(|row| format!("<w:tr>{}</w:tr>", row.iter().map(|c| cell(c)).collect::<String>()))
        .collect();
    format!("<w:tbl>{c_rows}</w:tbl>")
}

fn write_docx(path: &Path, rows: &[[&str; 7]]) {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        table_xml(rows)
    );
    let file = std::fs::File::create(path).expect("create docx");
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .expect("start entry");
    writer.write_all(xml.as_bytes()).expect("write entry");
    writer.finish().expect("finish zip");
}

const ROW_HEADER: [&str; 7] = ["Формат", "Зона", "Поз.", "Обозначение", "Наименование", "Кол.", "Примечание"];

fn write_fixtures(dir: &Path) {
    write_docx(
        &dir.join("assembly.docx"),
        &[
            ROW_HEADER,
            ["", "", "", "", "Документация", "", ""],
            ["A4", "", "", "КОР-01.10.000 СБ", "Сборочный чертеж", "", ""],
            ["", "", "", "", "Прочие изделия", "", ""],
            ["", "", "3", "", "Резистор 10 кОм", "2", "R1, R2"],
            ["", "", "4", "", "Резистор 4,7 кОм", "1", "R3"],
            ["", "", "5", "", "Конденсатор 0,1 мкФ", "5", "C1, C2, C3, C4, C5"],
            ["", "", "", "", "Стандартные изделия", "", ""],
            ["", "", "2", "", "Винт ISO 4762 M3x10", "2", ""],
            ["", "", "1", "", "Винт DIN 912 M3x10", "4", ""],
        ],
    );
    write_docx(
        &dir.join("board.docx"),
        &[
            ROW_HEADER,
            ["", "", "", "", "Прочие изделия", "", ""],
            ["", "", "1", "", "Резистор 4,7 кОм", "3", ""],
            ["", "", "", "", "Материалы", "", ""],
            ["", "", "2", "", "Припой ПОС-61", "1", ""],
        ],
    );
}

fn find_row(grid: &SpecSheetGrid, n_col: usize, c_text: &str) -> usize {
    (0..grid.height())
        .find(|n_row| grid.cell_text(*n_row, n_col) == c_text)
        .unwrap_or_else(|| panic!("no row with {c_text:?} in column {n_col}"))
}

#[test]
fn test_pipeline_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixtures(dir.path());
    let path_cfg = dir.path().join("bomkit.toml");
    std::fs::write(
        &path_cfg,
        r#"
variant = "extended"
output_dir = "out"

[[sources]]
path = "assembly.docx"
module = "КОР-01.10.000"

[[sources]]
path = "board.docx"
module = "КОР-01.20.000"
"#,
    )
    .expect("write config");

    let cfg = load_pipeline_config(&path_cfg).expect("config");
    let l_reports = run_pipeline(&cfg).expect("pipeline");
    let l_stages: Vec<&str> = l_reports.iter().map(|r| r.stage.as_str()).collect();
    assert_eq!(
        l_stages,
        vec!["parse", "classify", "sort", "compress", "split", "format", "wrap"]
    );
    assert_eq!(l_reports[0].rows_in, 6);

    let dir_out = dir.path().join("out");
    let parsed = read_sheet(&dir_out.join("BOMs_parsed.xlsx"), Some("BOM")).expect("parsed");
    assert_eq!(parsed.headers[2], "PosText");
    assert_eq!(parsed.cell_text(0, 3), "Винт DIN 912 M3x10");
    assert_eq!(parsed.cell_text(1, 3), "Винт ISO 4762 M3x10");
    assert_eq!(parsed.cell_text(2, 3), "Резистор 10 кОм");
    assert!(parsed.is_blank_row(5));
    assert_eq!(parsed.cell_text(6, 0), "КОР-01.20.000");

    let sorted = read_sheet(&dir_out.join("BOM_sorted.xlsx"), Some("BOM")).expect("sorted");
    let n_col_name = sorted.column_index("Name").expect("Name");
    let l_names: Vec<String> = (0..sorted.height()).map(|r| sorted.cell_text(r, n_col_name)).collect();
    assert_eq!(
        l_names,
        vec![
            "Конденсатор 0,1 мкФ",
            "Винт DIN 912 M3x10",
            "Винт ISO 4762 M3x10",
            "Резистор 4,7 кОм",
            "Резистор 4,7 кОм",
            "Резистор 10 кОм",
        ]
    );

    let split = read_sheet(&dir_out.join("BOM_split.xlsx"), Some("BOM")).expect("split");
    let n_col_clean = split.column_index("Name_Clean").expect("Name_Clean");
    let n_col_supply = split.column_index("SupplyDoc").expect("SupplyDoc");
    let n_row_din = find_row(&split, n_col_clean, "Винт M3x10");
    assert_eq!(split.cell_text(n_row_din, n_col_supply), "DIN 912");

    let wrapped = read_sheet(&dir_out.join("Vedomost_pokupnyh_wrapped.xlsx"), Some("ВП")).expect("wrapped");
    assert_eq!(wrapped.headers[0], "Наименование");
    assert_eq!(wrapped.cell_text(0, 0), "Конденсаторы");
    let n_row_fast = find_row(&wrapped, 0, "Крепежные изделия");
    assert!(n_row_fast > find_row(&wrapped, 0, "Конденсатор 0,1 мкФ"));

    let n_row_cap = find_row(&wrapped, 0, "Конденсатор 0,1 мкФ");
    assert_eq!(wrapped.cell_text(n_row_cap, 9), "C1, C2, C3,");
    assert_eq!(wrapped.cell_text(n_row_cap + 1, 9), "C4, C5");
    assert!(wrapped.is_blank_row(n_row_cap + 2));

    let n_row_res = find_row(&wrapped, 0, "Резистор 4,7 кОм");
    assert_eq!(wrapped.cell_text(n_row_res, 4), "КОР-01.10.000");
    assert_eq!(wrapped.cell_text(n_row_res + 1, 4), "КОР-01.20.000");
    assert_eq!(wrapped.cell_text(n_row_res + 2, 8), "____\n4");
    assert!(matches!(wrapped.rows[n_row_res + 2][8], EnumCellValue::String(_)));
}

#[test]
fn test_compress_stage_writes_subtotal_formula() {
    let dir = tempfile::tempdir().expect("tempdir");
    let io = SpecStageIo::new(dir.path().join("sorted.xlsx"), dir.path().join("compressed.xlsx"), "BOM");
    let mut grid = SpecSheetGrid::new(&["Module", "PosText", "Name", "Qty", "Comment"]);
    grid.push_row(vec![
        EnumCellValue::text("M0"),
        EnumCellValue::Number(1.0),
        EnumCellValue::text("Capacitor C1"),
        EnumCellValue::Number(1.0),
        EnumCellValue::text("C1"),
    ]);
    for (n_qty, c_module) in [(1.0, "M1"), (2.0, "M2"), (3.0, "M3")] {
        grid.push_row(vec![
            EnumCellValue::text(c_module),
            EnumCellValue::Number(2.0),
            EnumCellValue::text("Resistor R1"),
            EnumCellValue::Number(n_qty),
            EnumCellValue::text("R1"),
        ]);
    }
    write_grid_to_file(io.path_in.clone(), &grid, "BOM", &SpecXlsxSheetWriteOptions::default())
        .expect("write input");

    let report = run_compress(&io).expect("compress");
    assert_eq!(report.rows_in, 4);

    let out = read_sheet(&io.path_out, Some("BOM")).expect("read");
    assert_eq!(out.cell_text(2, 2), "Resistor R1");
    for n_row in [3, 4] {
        assert_eq!(out.cell_text(n_row, 2), "");
        assert_eq!(out.cell_text(n_row, 4), "");
    }
    match &out.rows[5][3] {
        EnumCellValue::Formula { formula, result } => {
            assert!(formula.contains("SUM(D4:D6)"));
            assert!(result.contains('6'));
        }
        other => panic!("expected formula, got {other:?}"),
    }
    assert!(out.is_blank_row(6));
}

#[test]
fn test_parse_stage_reports_missing_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let l_sources = vec![SpecSourceDoc {
        path: dir.path().join("absent.docx"),
        module: "M".to_string(),
    }];
    let path_out = dir.path().join("parsed.xlsx");
    let err = run_parse(&l_sources, EnumExtractVariant::Extended, &path_out, "BOM").expect_err("missing");
    assert!(matches!(err, BomError::Docx(_)));
    assert!(!path_out.exists());
}
