//! # Stegvault JPEG
//!
//! Lossless access to the quantized DCT coefficients of baseline JPEG files.
//!
//! ```text
//! JPEG → parse → Huffman decode → [i16] coefficients → modify → Huffman encode → JPEG
//! ```
//!
//! Nothing is dequantized or transformed, so every coefficient that is not
//! touched comes back bit-identical. Re-encoding computes optimal Huffman
//! tables for the new coefficients, which keeps every symbol encodable no
//! matter how the values changed.
//!
//! ```rust,no_run
//! use stegvault_jpeg::JpegImage;
//!
//! let data = std::fs::read("photo.jpg").unwrap();
//! let mut image = JpegImage::decode(&data).unwrap();
//! for component in image.components_mut() {
//!     component.data[1] |= 1;
//! }
//! std::fs::write("photo-out.jpg", image.encode().unwrap()).unwrap();
//! ```

use log::debug;

pub mod error;
mod huffman;
pub mod marker;
mod parser;
mod scan;
mod writer;

pub use error::{JpegError, Result};
pub use huffman::HuffmanTable;
pub use parser::{parse_jpeg, Component, FrameInfo, JpegSegments, Segment, ZIGZAG_TO_NATURAL};
pub use scan::{decode_scan, ComponentCoefficients};

use scan::{encode_scan, ScanWriter, SymbolStatistics};

/// A decoded JPEG: the file structure plus the quantized coefficients of its scan.
#[derive(Debug, Clone)]
pub struct JpegImage {
    segments: JpegSegments,
    components: Vec<ComponentCoefficients>,
}

impl JpegImage {
    pub fn decode(data: &[u8]) -> Result<Self> {
        let segments = parse_jpeg(data)?;
        let components = decode_scan(&segments)?;
        debug!(
            "decoded {}x{} JPEG with {} components",
            segments.frame.width,
            segments.frame.height,
            components.len()
        );
        Ok(JpegImage {
            segments,
            components,
        })
    }

    pub fn width(&self) -> u16 {
        self.segments.frame.width
    }

    pub fn height(&self) -> u16 {
        self.segments.frame.height
    }

    pub fn frame(&self) -> &FrameInfo {
        &self.segments.frame
    }

    /// Coefficients per component, in frame component order.
    pub fn components(&self) -> &[ComponentCoefficients] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [ComponentCoefficients] {
        &mut self.components
    }

    /// Entropy code the current coefficients into a complete JPEG file.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let frame = &self.segments.frame;
        let restart_interval = self.segments.restart_interval;

        let mut statistics = SymbolStatistics::default();
        encode_scan(frame, &self.components, restart_interval, &mut statistics)?;

        let mut dc_tables: [Option<HuffmanTable>; 4] = Default::default();
        let mut ac_tables: [Option<HuffmanTable>; 4] = Default::default();
        for component in &frame.components {
            let (dc, ac) = (component.dc_table_id as usize, component.ac_table_id as usize);
            if dc_tables[dc].is_none() {
                dc_tables[dc] = Some(HuffmanTable::optimal(&statistics.dc[dc])?);
            }
            if ac_tables[ac].is_none() {
                ac_tables[ac] = Some(HuffmanTable::optimal(&statistics.ac[ac])?);
            }
        }

        let mut dht = Vec::new();
        for (class, tables) in [(0u8, &dc_tables), (1u8, &ac_tables)] {
            for (id, table) in tables.iter().enumerate() {
                if let Some(table) = table {
                    table.to_dht_entry(class, id as u8, &mut dht);
                }
            }
        }

        let mut writer = ScanWriter::new(&dc_tables, &ac_tables, self.segments.scan_data.len())?;
        encode_scan(frame, &self.components, restart_interval, &mut writer)?;
        let scan_data = writer.into_bytes();
        debug!(
            "re-encoded scan: {} bytes (was {})",
            scan_data.len(),
            self.segments.scan_data.len()
        );

        Ok(writer::write_jpeg(&self.segments, &dht, &scan_data))
    }
}
