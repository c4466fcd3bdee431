//! Splits a JPEG file into the pieces needed to transcode its scan.
//!
//! Every segment before the scan is kept verbatim for reassembly, except DHT
//! segments: their tables are parsed and later replaced by freshly optimized
//! ones.

use log::trace;

use crate::error::{JpegError, Result};
use crate::huffman::HuffmanTable;
use crate::marker::Marker;

/// Zigzag index to natural (row-major) index.
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// A segment kept for reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub marker: Marker,
    /// Payload without marker and length bytes.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_table_id: u8,
    /// Assigned by the SOS header.
    pub dc_table_id: u8,
    /// Assigned by the SOS header.
    pub ac_table_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// SOF process number, 0 for baseline and 1 for extended sequential.
    pub sof_type: u8,
    pub precision: u8,
    pub width: u16,
    pub height: u16,
    pub components: Vec<Component>,
}

impl FrameInfo {
    pub fn max_h_sampling(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.h_sampling as usize)
            .max()
            .unwrap_or(1)
    }

    pub fn max_v_sampling(&self) -> usize {
        self.components
            .iter()
            .map(|c| c.v_sampling as usize)
            .max()
            .unwrap_or(1)
    }
}

/// A parsed single scan JPEG.
#[derive(Debug, Clone)]
pub struct JpegSegments {
    /// Non-DHT segments between SOI and SOS, in file order.
    pub segments: Vec<Segment>,
    pub dc_tables: [Option<HuffmanTable>; 4],
    pub ac_tables: [Option<HuffmanTable>; 4],
    pub frame: FrameInfo,
    /// Restart interval in MCUs, 0 when restarts are disabled.
    pub restart_interval: u16,
    /// Raw SOS header payload.
    pub sos_header: Vec<u8>,
    /// Entropy coded data, still byte stuffed and with RST markers in place.
    pub scan_data: Vec<u8>,
    /// Bytes following EOI.
    pub trailer: Vec<u8>,
}

/// Parse a baseline or extended sequential Huffman coded JPEG.
pub fn parse_jpeg(data: &[u8]) -> Result<JpegSegments> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != Marker::Soi.to_u8() {
        return Err(JpegError::malformed("missing SOI marker"));
    }

    let mut pos = 2;
    let mut segments = Vec::new();
    let mut dc_tables: [Option<HuffmanTable>; 4] = Default::default();
    let mut ac_tables: [Option<HuffmanTable>; 4] = Default::default();
    let mut frame: Option<FrameInfo> = None;
    let mut restart_interval = 0u16;

    loop {
        let marker = read_marker(data, &mut pos)?;
        if !marker.has_length() {
            match marker {
                Marker::Eoi => return Err(JpegError::malformed("image ends before any scan")),
                _ => continue,
            }
        }

        let payload = read_segment(data, &mut pos)?;
        trace!("segment {:?} with {} bytes", marker, payload.len());

        match marker {
            Marker::Sof(n) => {
                if frame.is_some() {
                    return Err(JpegError::malformed("more than one frame header"));
                }
                frame = Some(parse_sof(n, payload)?);
            }
            Marker::Dht => parse_dht(payload, &mut dc_tables, &mut ac_tables)?,
            Marker::Dac => return Err(JpegError::unsupported("arithmetic coding")),
            Marker::Dri => {
                if payload.len() < 2 {
                    return Err(JpegError::malformed("DRI segment too short"));
                }
                restart_interval = u16::from_be_bytes([payload[0], payload[1]]);
            }
            Marker::Sos => {
                let mut frame = frame.ok_or_else(|| JpegError::malformed("scan before frame header"))?;
                parse_sos(payload, &mut frame)?;
                let sos_header = payload.to_vec();

                let scan_end = find_scan_end(data, pos);
                let scan_data = data[pos..scan_end].to_vec();
                let trailer = match Marker::from_u8(*data.get(scan_end + 1).unwrap_or(&0xD9)) {
                    Some(Marker::Eoi) => data.get(scan_end + 2..).unwrap_or_default().to_vec(),
                    Some(Marker::Dnl) => return Err(JpegError::unsupported("DNL marker")),
                    _ => return Err(JpegError::unsupported("multiple scans")),
                };
                trace!(
                    "scan of {} bytes, {} trailing bytes",
                    scan_data.len(),
                    trailer.len()
                );

                return Ok(JpegSegments {
                    segments,
                    dc_tables,
                    ac_tables,
                    frame,
                    restart_interval,
                    sos_header,
                    scan_data,
                    trailer,
                });
            }
            _ => {}
        }

        if marker != Marker::Dht {
            segments.push(Segment {
                marker,
                data: payload.to_vec(),
            });
        }
    }
}

fn read_marker(data: &[u8], pos: &mut usize) -> Result<Marker> {
    if data.get(*pos) != Some(&0xFF) {
        return Err(JpegError::malformed(format!("expected marker at offset {pos}")));
    }
    while data.get(*pos) == Some(&0xFF) {
        *pos += 1;
    }
    let byte = *data
        .get(*pos)
        .ok_or_else(|| JpegError::malformed("data ends inside a marker"))?;
    *pos += 1;

    Marker::from_u8(byte)
        .ok_or_else(|| JpegError::malformed(format!("invalid marker byte 0x{byte:02X}")))
}

fn read_segment<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    let header = data
        .get(*pos..*pos + 2)
        .ok_or_else(|| JpegError::malformed("truncated segment length"))?;
    let length = u16::from_be_bytes([header[0], header[1]]) as usize;
    if length < 2 {
        return Err(JpegError::malformed("segment length too small"));
    }
    let payload = data
        .get(*pos + 2..*pos + length)
        .ok_or_else(|| JpegError::malformed("truncated segment"))?;
    *pos += length;
    Ok(payload)
}

/// Offset of the first marker that terminates the scan, RST markers and
/// stuffed bytes belong to the scan. Returns `data.len()` when no marker follows.
fn find_scan_end(data: &[u8], mut pos: usize) -> usize {
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        match data[pos + 1] {
            0x00 | 0xD0..=0xD7 => pos += 2,
            0xFF => pos += 1,
            _ => return pos,
        }
    }
    data.len()
}

fn parse_sof(sof_type: u8, data: &[u8]) -> Result<FrameInfo> {
    match sof_type {
        0 | 1 => {}
        2 | 6 | 10 | 14 => return Err(JpegError::unsupported("progressive coding")),
        3 | 7 | 11 | 15 => return Err(JpegError::unsupported("lossless coding")),
        9 | 13 => return Err(JpegError::unsupported("arithmetic coding")),
        n => return Err(JpegError::unsupported(format!("SOF{n} frames"))),
    }
    if data.len() < 6 {
        return Err(JpegError::malformed("SOF segment too short"));
    }

    let precision = data[0];
    if precision != 8 {
        return Err(JpegError::unsupported(format!("{precision} bit samples")));
    }
    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    if width == 0 || height == 0 {
        return Err(JpegError::unsupported("image height defined by DNL"));
    }

    let count = data[5] as usize;
    if count == 0 || count > 4 || data.len() < 6 + count * 3 {
        return Err(JpegError::malformed("invalid frame component list"));
    }

    let components = data[6..6 + count * 3]
        .chunks_exact(3)
        .map(|spec| {
            let (h, v) = (spec[1] >> 4, spec[1] & 0x0F);
            if !(1..=4).contains(&h) || !(1..=4).contains(&v) {
                return Err(JpegError::malformed("invalid sampling factor"));
            }
            Ok(Component {
                id: spec[0],
                h_sampling: h,
                v_sampling: v,
                quant_table_id: spec[2],
                dc_table_id: 0,
                ac_table_id: 0,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FrameInfo {
        sof_type,
        precision,
        width,
        height,
        components,
    })
}

fn parse_dht(
    data: &[u8],
    dc_tables: &mut [Option<HuffmanTable>; 4],
    ac_tables: &mut [Option<HuffmanTable>; 4],
) -> Result<()> {
    let mut pos = 0;
    while pos < data.len() {
        let class = data[pos] >> 4;
        let id = data[pos] & 0x0F;
        if class > 1 || id > 3 {
            return Err(JpegError::malformed(format!(
                "invalid Huffman table class {class} id {id}"
            )));
        }

        let counts = data
            .get(pos + 1..pos + 17)
            .ok_or_else(|| JpegError::malformed("DHT segment too short"))?;
        let mut code_counts = [0u8; 16];
        code_counts.copy_from_slice(counts);
        let total: usize = code_counts.iter().map(|&n| n as usize).sum();
        let values = data
            .get(pos + 17..pos + 17 + total)
            .ok_or_else(|| JpegError::malformed("DHT segment too short"))?
            .to_vec();
        pos += 17 + total;

        let table = HuffmanTable::new(code_counts, values)?;
        if class == 0 {
            dc_tables[id as usize] = Some(table);
        } else {
            ac_tables[id as usize] = Some(table);
        }
    }
    Ok(())
}

fn parse_sos(data: &[u8], frame: &mut FrameInfo) -> Result<()> {
    let count = *data
        .first()
        .ok_or_else(|| JpegError::malformed("empty SOS header"))? as usize;
    if data.len() < 1 + count * 2 + 3 {
        return Err(JpegError::malformed("SOS header too short"));
    }
    if count != frame.components.len() {
        return Err(JpegError::unsupported("multiple scans"));
    }

    for (i, spec) in data[1..1 + count * 2].chunks_exact(2).enumerate() {
        if frame.components[i].id != spec[0] {
            return Err(if frame.components.iter().any(|c| c.id == spec[0]) {
                JpegError::unsupported("scan component order differs from frame")
            } else {
                JpegError::malformed(format!("scan references unknown component {}", spec[0]))
            });
        }
        let component = &mut frame.components[i];
        component.dc_table_id = spec[1] >> 4;
        component.ac_table_id = spec[1] & 0x0F;
        if component.dc_table_id > 3 || component.ac_table_id > 3 {
            return Err(JpegError::malformed("invalid Huffman table selector"));
        }
    }

    let spectral = &data[1 + count * 2..];
    if spectral[0] != 0 || spectral[1] != 63 || spectral[2] != 0 {
        return Err(JpegError::unsupported("spectral selection or successive approximation"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn gray_frame(sof: u8) -> Vec<u8> {
        segment(sof, &[8, 0, 8, 0, 8, 1, 1, 0x11, 0])
    }

    fn minimal_jpeg(sof: u8, scan: &[u8], tail: &[u8]) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(0xE0, b"JFIF\0"));
        data.extend(gray_frame(sof));
        // one DC code "0" for category 0, one AC code "0" for EOB
        data.extend(segment(0xC4, &[0x00, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        data.extend(segment(0xC4, &[0x10, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        data.extend(segment(0xDA, &[1, 1, 0x00, 0, 63, 0]));
        data.extend_from_slice(scan);
        data.extend_from_slice(tail);
        data
    }

    #[test]
    fn zigzag_is_a_permutation() {
        let mut seen = [false; 64];
        for &n in &ZIGZAG_TO_NATURAL {
            assert!(!seen[n]);
            seen[n] = true;
        }
    }

    #[test]
    fn parses_structure() {
        let jpeg = minimal_jpeg(0xC0, &[0x3F, 0xFF, 0x00], &[0xFF, 0xD9, 0xAA]);
        let parsed = parse_jpeg(&jpeg).unwrap();

        assert_eq!(parsed.frame.width, 8);
        assert_eq!(parsed.frame.components.len(), 1);
        assert!(parsed.dc_tables[0].is_some());
        assert!(parsed.ac_tables[0].is_some());
        assert_eq!(parsed.scan_data, vec![0x3F, 0xFF, 0x00]);
        assert_eq!(parsed.trailer, vec![0xAA]);
        // DHT is dropped, APP0 and SOF kept
        let markers: Vec<_> = parsed.segments.iter().map(|s| s.marker).collect();
        assert_eq!(markers, vec![Marker::App(0), Marker::Sof(0)]);
    }

    #[test]
    fn restart_markers_stay_inside_the_scan() {
        let jpeg = minimal_jpeg(0xC0, &[0x3F, 0xFF, 0xD0, 0x3F], &[0xFF, 0xD9]);
        let parsed = parse_jpeg(&jpeg).unwrap();
        assert_eq!(parsed.scan_data, vec![0x3F, 0xFF, 0xD0, 0x3F]);
    }

    #[test]
    fn rejects_progressive() {
        let jpeg = minimal_jpeg(0xC2, &[0x00], &[0xFF, 0xD9]);
        assert!(matches!(parse_jpeg(&jpeg), Err(JpegError::Unsupported { .. })));
    }

    #[test]
    fn rejects_second_scan() {
        let mut tail = segment(0xDA, &[1, 1, 0x00, 0, 63, 0]);
        tail.extend_from_slice(&[0x00, 0xFF, 0xD9]);
        let jpeg = minimal_jpeg(0xC0, &[0x00], &tail);
        assert!(matches!(parse_jpeg(&jpeg), Err(JpegError::Unsupported { .. })));
    }

    #[test]
    fn reordered_scan_components_are_unsupported() {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(0xC0, &[8, 0, 8, 0, 8, 2, 1, 0x11, 0, 2, 0x11, 0]));
        data.extend(segment(0xC4, &[0x00, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        data.extend(segment(0xC4, &[0x10, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        data.extend(segment(0xDA, &[2, 2, 0x00, 1, 0x00, 0, 63, 0]));
        data.extend_from_slice(&[0x00, 0xFF, 0xD9]);

        assert!(matches!(parse_jpeg(&data), Err(JpegError::Unsupported { .. })));
    }

    #[test]
    fn unknown_scan_component_is_malformed() {
        let mut data = vec![0xFF, 0xD8];
        data.extend(gray_frame(0xC0));
        data.extend(segment(0xC4, &[0x00, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        data.extend(segment(0xDA, &[1, 7, 0x00, 0, 63, 0]));
        data.extend_from_slice(&[0x00, 0xFF, 0xD9]);

        assert!(matches!(parse_jpeg(&data), Err(JpegError::Malformed { .. })));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_jpeg(&[0, 0, 0]), Err(JpegError::Malformed { .. })));
        assert!(matches!(
            parse_jpeg(&[0xFF, 0xD8, 0xFF, 0xD9]),
            Err(JpegError::Malformed { .. })
        ));
        let truncated = minimal_jpeg(0xC0, &[], &[]);
        assert!(parse_jpeg(&truncated[..20]).is_err());
    }
}
