//! Reassembles a JPEG file around a re-encoded scan.

use crate::marker::Marker;
use crate::parser::JpegSegments;

fn push_marker(out: &mut Vec<u8>, marker: Marker) {
    out.push(0xFF);
    out.push(marker.to_u8());
}

fn push_segment(out: &mut Vec<u8>, marker: Marker, payload: &[u8]) {
    push_marker(out, marker);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
}

/// Write SOI, the kept segments, the new DHT, the original SOS header, the new
/// scan data, EOI and whatever followed EOI in the source file.
pub fn write_jpeg(segments: &JpegSegments, dht: &[u8], scan_data: &[u8]) -> Vec<u8> {
    let kept: usize = segments.segments.iter().map(|s| s.data.len() + 4).sum();
    let mut out = Vec::with_capacity(
        kept + dht.len() + segments.sos_header.len() + scan_data.len() + segments.trailer.len() + 12,
    );

    push_marker(&mut out, Marker::Soi);
    for segment in &segments.segments {
        push_segment(&mut out, segment.marker, &segment.data);
    }
    push_segment(&mut out, Marker::Dht, dht);
    push_segment(&mut out, Marker::Sos, &segments.sos_header);
    out.extend_from_slice(scan_data);
    push_marker(&mut out, Marker::Eoi);
    out.extend_from_slice(&segments.trailer);

    out
}
