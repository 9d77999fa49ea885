//! Shared fixtures for unit tests: mock OCR engines and EPUB/ZIP builders.

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};
use tempfile::NamedTempFile;
use zip::{write::SimpleFileOptions, ZipWriter};

use crate::extract::EpubExtractor;
use crate::ocr::{EngineOutput, OcrEngine, OcrError, OcrLine, OcrPool, OcrWorker};

pub const CHAPTER_TEXT: &str = "Chapter 1 Chapter 1: Introduction This is a test chapter with some sample text content. This EPUB file is used for testing the text extraction functionality.";

pub const CHAPTER_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
    <title>Chapter 1</title>
</head>
<body>
    <h1>Chapter 1: Introduction</h1>
    <p>This is a test chapter with some sample text content.</p>
    <p>This EPUB file is used for testing the text extraction functionality.</p>
</body>
</html>"#;

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
    </rootfiles>
</container>"#;

const TOC_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx version="2005-1" xmlns="http://www.daisy.org/z3986/2005/ncx/">
    <head>
        <meta name="dtb:uid" content="test-book-123"/>
    </head>
    <docTitle>
        <text>Test Book</text>
    </docTitle>
    <navMap>
        <navPoint id="chapter1">
            <navLabel><text>Chapter 1</text></navLabel>
            <content src="chapter1.xhtml"/>
        </navPoint>
    </navMap>
</ncx>"#;

/// Engine returning a fixed result
pub struct StaticEngine {
    output: EngineOutput,
    last_classify_angle: Mutex<Option<bool>>,
    last_dimensions: Mutex<Option<(u32, u32)>>,
}

impl StaticEngine {
    pub fn new(output: EngineOutput) -> Self {
        Self {
            output,
            last_classify_angle: Mutex::new(None),
            last_dimensions: Mutex::new(None),
        }
    }

    /// Two lines, as a typical engine returns for a caption image
    pub fn reference() -> Self {
        Self::new(Some(vec![vec![
            OcrLine::new("Sample OCR text", 0.95),
            OcrLine::new("More OCR text", 0.90),
        ]]))
    }

    pub fn last_classify_angle(&self) -> Option<bool> {
        *self.last_classify_angle.lock().unwrap()
    }

    pub fn last_dimensions(&self) -> Option<(u32, u32)> {
        *self.last_dimensions.lock().unwrap()
    }
}

impl OcrEngine for StaticEngine {
    fn name(&self) -> &'static str {
        "static"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn recognize(&self, image: &RgbImage, classify_angle: bool) -> Result<EngineOutput, OcrError> {
        *self.last_classify_angle.lock().unwrap() = Some(classify_angle);
        *self.last_dimensions.lock().unwrap() = Some(image.dimensions());
        Ok(self.output.clone())
    }
}

/// Engine that always errors
pub struct FailingEngine;

impl OcrEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn recognize(&self, _image: &RgbImage, _classify_angle: bool) -> Result<EngineOutput, OcrError> {
        Err(OcrError::ProcessingError("OCR failed".to_string()))
    }
}

/// Engine that reports the image width as text.
///
/// Widths listed in `slow_widths` sleep first, widths in `fail_widths` error,
/// so tests can control completion order and failures per image.
pub struct WidthEngine {
    pub slow_widths: Vec<u32>,
    pub fail_widths: Vec<u32>,
    pub calls: AtomicUsize,
}

impl WidthEngine {
    pub fn new() -> Self {
        Self {
            slow_widths: Vec::new(),
            fail_widths: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl OcrEngine for WidthEngine {
    fn name(&self) -> &'static str {
        "width"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn recognize(&self, image: &RgbImage, _classify_angle: bool) -> Result<EngineOutput, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let width = image.width();
        if self.slow_widths.contains(&width) {
            std::thread::sleep(Duration::from_millis(150));
        }
        if self.fail_widths.contains(&width) {
            return Err(OcrError::ProcessingError(format!("width {} rejected", width)));
        }
        Ok(Some(vec![vec![OcrLine::new(format!("image {}", width), 0.9)]]))
    }
}

pub fn extractor(engine: Arc<dyn OcrEngine>, workers: usize) -> EpubExtractor {
    EpubExtractor::new(OcrPool::new(OcrWorker::new(engine, true), workers))
}

/// PNG bytes of a white image of the given size
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// JPEG bytes of a CMYK image of the given size
pub fn cmyk_jpeg(width: u16, height: u16) -> Vec<u8> {
    let pixels: Vec<u8> = (0..width as usize * height as usize)
        .flat_map(|i| [(i % 256) as u8, 40, 200, 10])
        .collect();
    let mut buffer = Vec::new();
    jpeg_encoder::Encoder::new(&mut buffer, 90)
        .encode(&pixels, width, height, jpeg_encoder::ColorType::Cmyk)
        .unwrap();
    buffer
}

/// Write `entries` (in order) into a ZIP in a temp file
pub fn zip_file(entries: &[(&str, Vec<u8>)]) -> NamedTempFile {
    let file = tempfile::Builder::new().suffix(".epub").tempfile().unwrap();
    {
        let mut zip = ZipWriter::new(file.reopen().unwrap());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }
    file
}

/// Hand-assembled stored ZIP whose entry `inflated` claims `declared`
/// uncompressed bytes through a zip64 extra field in the central directory.
/// The local header and the data stay truthful.
pub fn stored_zip_with_declared_size(
    entries: &[(&str, Vec<u8>)],
    inflated: &str,
    declared: u64,
) -> NamedTempFile {
    const DOS_DATE: u16 = (1 << 5) | 1;

    let mut out: Vec<u8> = Vec::new();
    let mut central: Vec<u8> = Vec::new();

    for (name, data) in entries {
        let offset = out.len() as u32;
        let crc = crc32(data);
        let size = data.len() as u32;

        out.extend_from_slice(&0x04034b50u32.to_le_bytes());
        for field in [20u16, 0, 0, 0, DOS_DATE] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        for field in [crc, size, size] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);

        let extra: Vec<u8> = if *name == inflated {
            let mut extra = Vec::new();
            extra.extend_from_slice(&1u16.to_le_bytes());
            extra.extend_from_slice(&8u16.to_le_bytes());
            extra.extend_from_slice(&declared.to_le_bytes());
            extra
        } else {
            Vec::new()
        };
        let listed_size = if extra.is_empty() { size } else { u32::MAX };

        central.extend_from_slice(&0x02014b50u32.to_le_bytes());
        for field in [45u16, 45, 0, 0, 0, DOS_DATE] {
            central.extend_from_slice(&field.to_le_bytes());
        }
        for field in [crc, size, listed_size] {
            central.extend_from_slice(&field.to_le_bytes());
        }
        for field in [name.len() as u16, extra.len() as u16, 0, 0, 0] {
            central.extend_from_slice(&field.to_le_bytes());
        }
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
        central.extend_from_slice(&extra);
    }

    let central_offset = out.len() as u32;
    let central_size = central.len() as u32;
    out.extend_from_slice(&central);
    out.extend_from_slice(&0x06054b50u32.to_le_bytes());
    for field in [0u16, 0, entries.len() as u16, entries.len() as u16] {
        out.extend_from_slice(&field.to_le_bytes());
    }
    out.extend_from_slice(&central_size.to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    let file = tempfile::Builder::new().suffix(".epub").tempfile().unwrap();
    std::fs::write(file.path(), out).unwrap();
    file
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for byte in data {
        crc ^= *byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// Builder for minimal valid EPUBs
pub struct EpubFixture {
    chapters: Vec<(String, String)>,
    nav: Option<(String, String)>,
    images: Vec<(String, Vec<u8>)>,
    extra: Vec<(String, Vec<u8>)>,
}

impl EpubFixture {
    pub fn new() -> Self {
        Self {
            chapters: Vec::new(),
            nav: None,
            images: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// The single-chapter book used across tests
    pub fn reference() -> Self {
        Self::new().chapter("chapter1.xhtml", CHAPTER_XHTML)
    }

    pub fn chapter(mut self, href: &str, xhtml: &str) -> Self {
        self.chapters.push((href.to_string(), xhtml.to_string()));
        self
    }

    /// Add an EPUB 3 navigation document (`properties="nav"`), listed after
    /// the chapters
    pub fn nav(mut self, href: &str, xhtml: &str) -> Self {
        self.nav = Some((href.to_string(), xhtml.to_string()));
        self
    }

    /// Add an image under `OEBPS/images/` and to the manifest
    pub fn image(mut self, name: &str, data: Vec<u8>) -> Self {
        self.images.push((name.to_string(), data));
        self
    }

    /// Add an archive entry not listed in the manifest
    pub fn raw_entry(mut self, path: &str, data: Vec<u8>) -> Self {
        self.extra.push((path.to_string(), data));
        self
    }

    fn content_opf(&self) -> String {
        let mut manifest = String::new();
        let mut spine = String::new();
        for (i, (href, _)) in self.chapters.iter().enumerate() {
            manifest.push_str(&format!(
                "        <item id=\"chapter{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
                i + 1,
                href
            ));
            spine.push_str(&format!("        <itemref idref=\"chapter{}\"/>\n", i + 1));
        }
        if let Some((href, _)) = &self.nav {
            manifest.push_str(&format!(
                "        <item id=\"nav\" href=\"{}\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
                href
            ));
        }
        for (i, (name, _)) in self.images.iter().enumerate() {
            let media_type = if name.to_lowercase().ends_with(".png") {
                "image/png"
            } else {
                "image/jpeg"
            };
            manifest.push_str(&format!(
                "        <item id=\"image{}\" href=\"images/{}\" media-type=\"{}\"/>\n",
                i + 1,
                name,
                media_type
            ));
        }
        manifest.push_str(
            "        <item id=\"toc\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
        );

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="bookid">
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>Test Book</dc:title>
        <dc:creator>Test Author</dc:creator>
        <dc:identifier id="bookid">test-book-123</dc:identifier>
        <dc:language>en</dc:language>
    </metadata>
    <manifest>
{}    </manifest>
    <spine toc="toc">
{}    </spine>
</package>"#,
            manifest, spine
        )
    }

    pub fn build(&self) -> NamedTempFile {
        let mut entries: Vec<(String, Vec<u8>)> = vec![
            ("mimetype".to_string(), b"application/epub+zip".to_vec()),
            (
                "META-INF/container.xml".to_string(),
                CONTAINER_XML.as_bytes().to_vec(),
            ),
            (
                "OEBPS/content.opf".to_string(),
                self.content_opf().into_bytes(),
            ),
        ];
        for (href, xhtml) in &self.chapters {
            entries.push((format!("OEBPS/{}", href), xhtml.as_bytes().to_vec()));
        }
        if let Some((href, xhtml)) = &self.nav {
            entries.push((format!("OEBPS/{}", href), xhtml.as_bytes().to_vec()));
        }
        for (name, data) in &self.images {
            entries.push((format!("OEBPS/images/{}", name), data.clone()));
        }
        entries.push(("OEBPS/toc.ncx".to_string(), TOC_NCX.as_bytes().to_vec()));
        entries.extend(self.extra.iter().cloned());

        let borrowed: Vec<(&str, Vec<u8>)> = entries
            .iter()
            .map(|(name, data)| (name.as_str(), data.clone()))
            .collect();
        zip_file(&borrowed)
    }
}

/// Path of a file that does not exist
pub fn missing_path() -> PathBuf {
    std::env::temp_dir().join("epub-ocr-server-missing").join("nope.epub")
}
