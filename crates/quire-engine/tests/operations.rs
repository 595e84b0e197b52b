// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end exercises of the engine operations.
//
// Bridge-backed operations run against nonexistent tool names, so the suite
// exercises the degraded/fallback paths and needs no external binaries.

use std::io::{Cursor, Read};
use std::path::Path;

use quire_core::EngineConfig;
use quire_core::error::QuireError;
use quire_core::types::{
    CompressionLevel, ConversionRequest, FileHandle, OutputPolicy, RasterFormat,
};
use quire_document::DocumentModel;
use quire_engine::{Engine, OpOutput};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Engine wired to a scratch dir, with every external tool pointing at a
/// binary that does not exist.
fn engine(dir: &Path) -> Engine {
    init_tracing();
    Engine::new(EngineConfig {
        temp_dir: dir.to_path_buf(),
        bridge_timeout_secs: 5,
        office_tool: "quire-test-no-office".into(),
        raster_tool: "quire-test-no-raster".into(),
        compressor_tool: "quire-test-no-qpdf".into(),
        fallback_compressor_tool: "quire-test-no-gs".into(),
        decrypt_tool: "quire-test-no-decrypt".into(),
        sign_tool: "quire-test-no-signer".into(),
        cleanup_delay_secs: 0,
        ..EngineConfig::default()
    })
}

/// Write a PDF with the given page sizes and hand it back as an upload.
/// Distinct sizes make page identity observable after restructuring.
fn pdf_handle(dir: &Path, name: &str, sizes: &[(f32, f32)]) -> FileHandle {
    let mut doc = DocumentModel::create();
    for &(w, h) in sizes {
        doc.add_blank_page(w, h).unwrap();
    }
    let path = dir.join(name);
    std::fs::write(&path, doc.serialize().unwrap()).unwrap();
    FileHandle::new("file", name, &path, "application/pdf")
}

fn png_handle(dir: &Path, name: &str, width: u32, height: u32) -> FileHandle {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 60]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, out.into_inner()).unwrap();
    FileHandle::new("file", name, &path, "image/png")
}

fn load_output(output: &OpOutput) -> DocumentModel {
    DocumentModel::from_bytes(output.as_bytes(), None).unwrap()
}

fn archive_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

fn archive_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    content
}

// -- merge / split / remove / add / reorder ----------------------------------

#[tokio::test]
async fn merge_concatenates_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let a = pdf_handle(dir.path(), "a.pdf", &[(100.0, 100.0), (101.0, 101.0)]);
    let b = pdf_handle(dir.path(), "b.pdf", &[(200.0, 200.0)]);

    let output = engine.merge(&[a, b]).unwrap();
    let merged = load_output(&output);
    assert_eq!(merged.page_count(), 3);
    assert_eq!(merged.page_size(0).unwrap().0, 100.0);
    assert_eq!(merged.page_size(1).unwrap().0, 101.0);
    assert_eq!(merged.page_size(2).unwrap().0, 200.0);
}

#[tokio::test]
async fn merge_of_nothing_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let err = engine(dir.path()).merge(&[]).unwrap_err();
    assert!(matches!(err, QuireError::NoFiles));
}

#[tokio::test]
async fn merge_is_fail_fast_on_corrupt_input() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let good = pdf_handle(dir.path(), "good.pdf", &[(100.0, 100.0)]);
    let bad_path = dir.path().join("bad.pdf");
    std::fs::write(&bad_path, b"this is not a pdf").unwrap();
    let bad = FileHandle::new("file", "bad.pdf", &bad_path, "application/pdf");

    let err = engine.merge(&[good, bad]).unwrap_err();
    assert!(matches!(err, QuireError::CorruptDocument(_)));
}

#[tokio::test]
async fn split_produces_one_entry_per_group() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(
        dir.path(),
        "doc.pdf",
        &[(100.0, 100.0), (101.0, 101.0), (102.0, 102.0)],
    );

    let output = engine.split(&file, "1-1,2-3").await.unwrap();
    let names = archive_names(output.as_bytes());
    assert_eq!(names, ["split_1.pdf", "split_2.pdf"]);

    let part2 = archive_entry(output.as_bytes(), "split_2.pdf");
    let part2 = DocumentModel::from_bytes(&part2, None).unwrap();
    assert_eq!(part2.page_count(), 2);
    assert_eq!(part2.page_size(0).unwrap().0, 101.0);
}

#[tokio::test]
async fn split_default_is_one_document_per_page() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(100.0, 100.0), (101.0, 101.0)]);

    let output = engine.split(&file, "").await.unwrap();
    assert_eq!(archive_names(output.as_bytes()).len(), 2);
}

#[tokio::test]
async fn remove_keeps_relative_order_and_ignores_unknown_pages() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(
        dir.path(),
        "doc.pdf",
        &[(100.0, 100.0), (101.0, 101.0), (102.0, 102.0)],
    );

    let output = engine.remove(&file, "2,99").unwrap();
    let result = load_output(&output);
    assert_eq!(result.page_count(), 2);
    assert_eq!(result.page_size(0).unwrap().0, 100.0);
    assert_eq!(result.page_size(1).unwrap().0, 102.0);
}

#[tokio::test]
async fn remove_with_an_empty_selection_keeps_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(
        dir.path(),
        "doc.pdf",
        &[(100.0, 100.0), (101.0, 101.0), (102.0, 102.0)],
    );

    let output = engine.remove(&file, "").unwrap();
    let result = load_output(&output);
    assert_eq!(result.page_count(), 3);
    assert_eq!(result.page_size(0).unwrap().0, 100.0);
    assert_eq!(result.page_size(1).unwrap().0, 101.0);
    assert_eq!(result.page_size(2).unwrap().0, 102.0);
}

#[tokio::test]
async fn add_splices_extras_at_the_insert_position() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let base = pdf_handle(dir.path(), "base.pdf", &[(100.0, 100.0), (101.0, 101.0)]);
    let x = pdf_handle(dir.path(), "x.pdf", &[(200.0, 200.0)]);
    let y = pdf_handle(dir.path(), "y.pdf", &[(300.0, 300.0)]);

    let output = engine.add(&base, &[x, y], Some(1)).unwrap();
    let result = load_output(&output);
    assert_eq!(result.page_count(), 4);
    let widths: Vec<f32> = (0..4).map(|i| result.page_size(i).unwrap().0).collect();
    assert_eq!(widths, [100.0, 200.0, 300.0, 101.0]);
}

#[tokio::test]
async fn add_position_clamps_to_the_end() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let base = pdf_handle(dir.path(), "base.pdf", &[(100.0, 100.0)]);
    let x = pdf_handle(dir.path(), "x.pdf", &[(200.0, 200.0)]);

    let output = engine.add(&base, &[x], Some(42)).unwrap();
    let result = load_output(&output);
    assert_eq!(result.page_size(1).unwrap().0, 200.0);
}

#[tokio::test]
async fn reorder_rebuilds_and_refuses_empty_orders() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(
        dir.path(),
        "doc.pdf",
        &[(100.0, 100.0), (101.0, 101.0), (102.0, 102.0)],
    );

    let output = engine.reorder(&file, "3,1").unwrap();
    let result = load_output(&output);
    assert_eq!(result.page_count(), 2);
    assert_eq!(result.page_size(0).unwrap().0, 102.0);
    assert_eq!(result.page_size(1).unwrap().0, 100.0);

    let err = engine.reorder(&file, "zebra,99").unwrap_err();
    assert!(matches!(err, QuireError::InvalidOrder));
}

// -- rotate / resize ----------------------------------------------------------

#[tokio::test]
async fn rotation_accumulates_across_operations() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(100.0, 100.0), (101.0, 101.0)]);

    let once = engine.rotate(&file, "1", 90).unwrap();
    let path = dir.path().join("rotated.pdf");
    std::fs::write(&path, once.as_bytes()).unwrap();
    let rotated = FileHandle::new("file", "rotated.pdf", &path, "application/pdf");

    let twice = engine.rotate(&rotated, "1", 270).unwrap();
    let result = load_output(&twice);
    assert_eq!(result.rotation(0).unwrap(), 0);
    assert_eq!(result.rotation(1).unwrap(), 0);
}

#[tokio::test]
async fn rotate_with_empty_selector_hits_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(100.0, 100.0), (101.0, 101.0)]);

    let output = engine.rotate(&file, "", 180).unwrap();
    let result = load_output(&output);
    assert_eq!(result.rotation(0).unwrap(), 180);
    assert_eq!(result.rotation(1).unwrap(), 180);
}

#[tokio::test]
async fn resize_keeps_an_axis_when_its_dimension_is_zero() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(100.0, 400.0), (200.0, 500.0)]);

    let output = engine.resize(&file, 595.0, 0.0).unwrap();
    let result = load_output(&output);
    assert_eq!(result.page_size(0).unwrap(), (595.0, 400.0));
    assert_eq!(result.page_size(1).unwrap(), (595.0, 500.0));
}

// -- stamping -----------------------------------------------------------------

#[tokio::test]
async fn overlay_applies_text_and_highlight_ops() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0)]);

    let ops = r##"[
        {"type":"text","text":"APPROVED","x":100,"y":700,"size":14,"color":"#ff0000"},
        {"type":"highlight","x":90,"y":690,"width":120,"height":24}
    ]"##;
    let output = engine.overlay(std::slice::from_ref(&file), ops).unwrap();
    let result = load_output(&output);
    let text = result.extract_text(10);
    assert!(text.contains("APPROVED"));
}

#[tokio::test]
async fn overlay_with_an_out_of_range_page_lands_on_the_first() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(
        dir.path(),
        "doc.pdf",
        &[(612.0, 792.0), (612.0, 792.0), (612.0, 792.0)],
    );

    let ops = r#"[{"type":"text","text":"FRONTMATTER","page":9}]"#;
    let output = engine.overlay(std::slice::from_ref(&file), ops).unwrap();
    let text = load_output(&output).extract_text(10);

    let first_page = text.split("=== Page 2 ===").next().unwrap();
    assert!(first_page.contains("FRONTMATTER"), "page 1 was: {first_page}");
    assert_eq!(text.matches("FRONTMATTER").count(), 1);
}

#[tokio::test]
async fn overlay_embeds_an_uploaded_image() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let base = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0)]);
    let logo = png_handle(dir.path(), "logo.png", 40, 40);

    let ops = r#"[{"type":"image","x":50,"y":600,"filename":"logo.png"}]"#;
    let output = engine.overlay(&[base, logo], ops).unwrap();
    assert!(load_output(&output).page_count() == 1);
}

#[tokio::test]
async fn malformed_overlay_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0)]);

    let err = engine.overlay(&[file], "{broken").unwrap_err();
    assert!(matches!(err, QuireError::Json(_)));
}

#[tokio::test]
async fn paginate_numbers_from_the_start_value() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0), (612.0, 792.0)]);

    let output = engine.paginate(&file, 5).unwrap();
    let text = load_output(&output).extract_text(10);
    assert!(text.contains('5'));
    assert!(text.contains('6'));
}

#[tokio::test]
async fn watermark_stamps_every_page() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0), (612.0, 792.0)]);

    let output = engine.watermark(&file, Some("CONFIDENTIAL")).unwrap();
    let text = load_output(&output).extract_text(10);
    assert_eq!(text.matches("CONFIDENTIAL").count(), 2);
}

// -- protect / unprotect ------------------------------------------------------

#[tokio::test]
async fn protect_round_trips_through_the_password() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(100.0, 100.0), (101.0, 101.0)]);

    let output = engine.protect(&file, "hunter2").unwrap();
    assert!(matches!(
        DocumentModel::from_bytes(output.as_bytes(), None),
        Err(QuireError::RequiresPassword)
    ));
    let unlocked = DocumentModel::from_bytes(output.as_bytes(), Some("hunter2")).unwrap();
    assert_eq!(unlocked.page_count(), 2);
}

#[tokio::test]
async fn unprotect_of_a_plain_document_reserializes_it() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(100.0, 100.0)]);

    // Decryption tool is unavailable; the plain input passes through.
    let output = engine.unprotect(&file, "whatever").await.unwrap();
    assert_eq!(load_output(&output).page_count(), 1);
}

#[tokio::test]
async fn unprotect_of_an_encrypted_document_without_a_tool_is_wrong_password() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let plain = pdf_handle(dir.path(), "doc.pdf", &[(100.0, 100.0)]);

    let protected = engine.protect(&plain, "secret").unwrap();
    let path = dir.path().join("locked.pdf");
    std::fs::write(&path, protected.as_bytes()).unwrap();
    let locked = FileHandle::new("file", "locked.pdf", &path, "application/pdf");

    let err = engine.unprotect(&locked, "secret").await.unwrap_err();
    assert!(matches!(err, QuireError::WrongPassword));
}

// -- compress / sign ----------------------------------------------------------

#[tokio::test]
async fn compress_without_any_tool_reports_no_compressor() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(100.0, 100.0)]);

    let err = engine
        .compress(&file, CompressionLevel::Ebook)
        .await
        .unwrap_err();
    assert!(matches!(err, QuireError::NoCompressorAvailable));
}

#[tokio::test]
async fn sign_without_credentials_stamps_a_visual_signature() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0)]);

    let output = engine.sign(&file, Some("Ada Lovelace"), None, None).await.unwrap();
    let text = load_output(&output).extract_text(10);
    assert!(text.contains("Signed by: Ada Lovelace"));
}

#[tokio::test]
async fn sign_falls_back_to_visual_when_the_signer_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0)]);
    let keystore_path = dir.path().join("keys.p12");
    std::fs::write(&keystore_path, b"stub").unwrap();
    let keystore = FileHandle::new("cert", "keys.p12", &keystore_path, "application/x-pkcs12");

    let output = engine
        .sign(&file, None, Some(&keystore), Some("pw"))
        .await
        .unwrap();
    let text = load_output(&output).extract_text(10);
    assert!(text.contains("Signed by: Unknown"));
}

// -- compare / extract --------------------------------------------------------

#[tokio::test]
async fn compare_reports_counts_and_first_page_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let a = pdf_handle(dir.path(), "a.pdf", &[(100.0, 200.0), (101.0, 201.0)]);
    let b = pdf_handle(dir.path(), "b.pdf", &[(300.0, 400.0)]);

    let output = engine.compare(&a, &b).unwrap();
    assert_eq!(output.content_type(), "application/json");
    let report: serde_json::Value = serde_json::from_slice(output.as_bytes()).unwrap();
    assert_eq!(report["pages_a"], 2);
    assert_eq!(report["pages_b"], 1);
    assert_eq!(report["same_page_count"], false);
    assert_eq!(report["first_page_dims_a"][0], 100.0);
    assert_eq!(report["first_page_dims_b"][1], 400.0);
}

#[tokio::test]
async fn compare_a_document_with_itself_reports_equality() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let a = pdf_handle(dir.path(), "a.pdf", &[(100.0, 200.0), (101.0, 201.0)]);

    let output = engine.compare(&a, &a).unwrap();
    let report: serde_json::Value = serde_json::from_slice(output.as_bytes()).unwrap();
    assert_eq!(report["pages_a"], report["pages_b"]);
    assert_eq!(report["same_page_count"], true);
    assert_eq!(report["first_page_dims_a"], report["first_page_dims_b"]);
}

#[tokio::test]
async fn extract_degrades_gracefully_without_a_rasterizer() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0)]);

    let output = engine.extract(&file).await.unwrap();
    let names = archive_names(output.as_bytes());
    assert_eq!(names, ["document.pdf", "text.txt"]);

    let document = archive_entry(output.as_bytes(), "document.pdf");
    assert_eq!(DocumentModel::from_bytes(&document, None).unwrap().page_count(), 1);
}

// -- conversion pipeline ------------------------------------------------------

#[tokio::test]
async fn convert_refuses_empty_requests() {
    let dir = tempfile::tempdir().unwrap();
    let err = engine(dir.path())
        .convert(ConversionRequest {
            files: vec![],
            policy: OutputPolicy::SingleMerged,
            raster_target: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QuireError::NoFiles));
}

#[tokio::test]
async fn convert_turns_an_image_into_a_full_page_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let logo = png_handle(dir.path(), "shot.png", 300, 150);

    let output = engine
        .convert(ConversionRequest {
            files: vec![logo],
            policy: OutputPolicy::SingleMerged,
            raster_target: None,
        })
        .await
        .unwrap();
    let result = load_output(&output);
    assert_eq!(result.page_count(), 1);
    let (w, h) = result.page_size(0).unwrap();
    assert!((w - 300.0).abs() < 1.0);
    assert!((h - 150.0).abs() < 1.0);
}

#[tokio::test]
async fn single_office_file_fails_strictly_without_a_converter() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let path = dir.path().join("memo.docx");
    std::fs::write(&path, b"stub office bytes").unwrap();
    let memo = FileHandle::new(
        "file",
        "memo.docx",
        &path,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    );

    let err = engine
        .convert(ConversionRequest {
            files: vec![memo],
            policy: OutputPolicy::SingleMerged,
            raster_target: None,
        })
        .await
        .unwrap_err();
    match err {
        QuireError::ConversionFailed { filename, .. } => assert_eq!(filename, "memo.docx"),
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn merged_conversion_stamps_placeholders_for_failed_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let good = pdf_handle(dir.path(), "good.pdf", &[(100.0, 100.0)]);
    let path = dir.path().join("memo.docx");
    std::fs::write(&path, b"stub").unwrap();
    let bad = FileHandle::new("file", "memo.docx", &path, "application/msword");

    let output = engine
        .convert(ConversionRequest {
            files: vec![good, bad],
            policy: OutputPolicy::SingleMerged,
            raster_target: None,
        })
        .await
        .unwrap();
    let result = load_output(&output);
    assert_eq!(result.page_count(), 2);
    assert_eq!(result.page_size(1).unwrap(), (600.0, 100.0));
    assert!(result.extract_text(10).contains("memo.docx"));
}

#[tokio::test]
async fn archived_conversion_writes_error_entries_for_failed_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let good = pdf_handle(dir.path(), "good.pdf", &[(100.0, 100.0)]);
    let logo = png_handle(dir.path(), "logo.png", 20, 20);
    let path = dir.path().join("memo.docx");
    std::fs::write(&path, b"stub").unwrap();
    let bad = FileHandle::new("file", "memo.docx", &path, "application/msword");

    let output = engine
        .convert(ConversionRequest {
            files: vec![good, logo, bad],
            policy: OutputPolicy::PerFileArchive,
            raster_target: None,
        })
        .await
        .unwrap();
    let names = archive_names(output.as_bytes());
    assert_eq!(names, ["good.pdf", "logo.pdf", "memo_ERROR.txt"]);

    let report = archive_entry(output.as_bytes(), "memo_ERROR.txt");
    let report = String::from_utf8(report).unwrap();
    assert!(report.starts_with("Failed: memo.docx"));
}

#[tokio::test]
async fn raster_conversion_without_a_tool_fails_with_the_filename() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(dir.path());
    let file = pdf_handle(dir.path(), "doc.pdf", &[(612.0, 792.0)]);

    let err = engine
        .convert(ConversionRequest {
            files: vec![file],
            policy: OutputPolicy::SingleMerged,
            raster_target: Some(RasterFormat::Png),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QuireError::ConversionFailed { .. }));
}
