//! Baseline scan decoding to quantized coefficients and back.
//!
//! No dequantization and no IDCT happens here, blocks are kept exactly as
//! they are entropy coded, in zigzag order.

use log::debug;

use crate::error::{JpegError, Result};
use crate::huffman::{encode_coefficient, BitReader, BitWriter, HuffmanEncoder, HuffmanLookup, HuffmanTable};
use crate::parser::{FrameInfo, JpegSegments};

/// Coefficients of one component, blocks in raster order, 64 zigzag ordered
/// values per block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentCoefficients {
    pub blocks_wide: usize,
    pub blocks_high: usize,
    pub data: Vec<i16>,
}

impl ComponentCoefficients {
    fn new(blocks_wide: usize, blocks_high: usize) -> Self {
        ComponentCoefficients {
            blocks_wide,
            blocks_high,
            data: vec![0; blocks_wide * blocks_high * 64],
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks_wide * self.blocks_high
    }

    #[inline]
    pub fn block(&self, index: usize) -> &[i16] {
        &self.data[index * 64..index * 64 + 64]
    }

    #[inline]
    pub fn block_mut(&mut self, index: usize) -> &mut [i16] {
        &mut self.data[index * 64..index * 64 + 64]
    }
}

/// How blocks are grouped into MCUs.
#[derive(Debug, Clone)]
pub(crate) struct ScanLayout {
    mcus_wide: usize,
    mcus_high: usize,
    /// (h, v) blocks per MCU and component, (1, 1) for non-interleaved scans.
    mcu_blocks: Vec<(usize, usize)>,
    /// (blocks wide, blocks high) per component.
    dimensions: Vec<(usize, usize)>,
}

impl ScanLayout {
    pub(crate) fn new(frame: &FrameInfo) -> Self {
        let h_max = frame.max_h_sampling();
        let v_max = frame.max_v_sampling();
        let width = frame.width as usize;
        let height = frame.height as usize;

        if let [component] = frame.components.as_slice() {
            let comp_width = (width * component.h_sampling as usize).div_ceil(h_max);
            let comp_height = (height * component.v_sampling as usize).div_ceil(v_max);
            let wide = comp_width.div_ceil(8);
            let high = comp_height.div_ceil(8);
            return ScanLayout {
                mcus_wide: wide,
                mcus_high: high,
                mcu_blocks: vec![(1, 1)],
                dimensions: vec![(wide, high)],
            };
        }

        let mcus_wide = width.div_ceil(8 * h_max);
        let mcus_high = height.div_ceil(8 * v_max);
        let mcu_blocks: Vec<_> = frame
            .components
            .iter()
            .map(|c| (c.h_sampling as usize, c.v_sampling as usize))
            .collect();
        let dimensions = mcu_blocks
            .iter()
            .map(|&(h, v)| (mcus_wide * h, mcus_high * v))
            .collect();

        ScanLayout {
            mcus_wide,
            mcus_high,
            mcu_blocks,
            dimensions,
        }
    }

    pub(crate) fn allocate(&self) -> Vec<ComponentCoefficients> {
        self.dimensions
            .iter()
            .map(|&(wide, high)| ComponentCoefficients::new(wide, high))
            .collect()
    }

    fn mcu_count(&self) -> usize {
        self.mcus_wide * self.mcus_high
    }

    /// Calls `visit(component, block index)` for every block of the MCU, in coding order.
    fn visit_mcu(
        &self,
        mcu: usize,
        mut visit: impl FnMut(usize, usize) -> Result<()>,
    ) -> Result<()> {
        let mcu_x = mcu % self.mcus_wide;
        let mcu_y = mcu / self.mcus_wide;
        for (component, &(h, v)) in self.mcu_blocks.iter().enumerate() {
            let blocks_wide = self.dimensions[component].0;
            for by in 0..v {
                for bx in 0..h {
                    let row = mcu_y * v + by;
                    let col = mcu_x * h + bx;
                    visit(component, row * blocks_wide + col)?;
                }
            }
        }
        Ok(())
    }
}

/// Huffman table selectors of a component.
#[derive(Debug, Clone, Copy)]
struct TableIds {
    dc: usize,
    ac: usize,
}

fn table_ids(frame: &FrameInfo) -> Vec<TableIds> {
    frame
        .components
        .iter()
        .map(|c| TableIds {
            dc: c.dc_table_id as usize,
            ac: c.ac_table_id as usize,
        })
        .collect()
}

/// Decode the whole scan into per component coefficients.
pub fn decode_scan(segments: &JpegSegments) -> Result<Vec<ComponentCoefficients>> {
    let layout = ScanLayout::new(&segments.frame);
    let ids = table_ids(&segments.frame);

    let dc = build_lookups(&segments.dc_tables)?;
    let ac = build_lookups(&segments.ac_tables)?;
    for id in &ids {
        if dc[id.dc].is_none() || ac[id.ac].is_none() {
            return Err(JpegError::malformed("scan references an undefined Huffman table"));
        }
    }

    let mut components = layout.allocate();
    let mut reader = BitReader::new(&segments.scan_data);
    let mut predictors = vec![0i32; ids.len()];
    let interval = segments.restart_interval as usize;

    for mcu in 0..layout.mcu_count() {
        if interval > 0 && mcu > 0 && mcu % interval == 0 {
            reader.restart()?;
            predictors.fill(0);
        }
        layout.visit_mcu(mcu, |component, block| {
            let TableIds { dc: dc_id, ac: ac_id } = ids[component];
            let (Some(dc_table), Some(ac_table)) = (&dc[dc_id], &ac[ac_id]) else {
                return Err(JpegError::malformed("undefined Huffman table"));
            };
            decode_block(
                &mut reader,
                components[component].block_mut(block),
                dc_table,
                ac_table,
                &mut predictors[component],
            )
        })?;
    }

    debug!(
        "decoded {} MCUs into {} blocks",
        layout.mcu_count(),
        components.iter().map(|c| c.block_count()).sum::<usize>()
    );
    Ok(components)
}

fn build_lookups(tables: &[Option<HuffmanTable>; 4]) -> Result<Vec<Option<HuffmanLookup>>> {
    tables
        .iter()
        .map(|t| t.as_ref().map(HuffmanLookup::new).transpose())
        .collect()
}

fn decode_block(
    reader: &mut BitReader,
    block: &mut [i16],
    dc_table: &HuffmanLookup,
    ac_table: &HuffmanLookup,
    predictor: &mut i32,
) -> Result<()> {
    block.fill(0);

    let size = reader.decode(dc_table)?;
    if size > 11 {
        return Err(JpegError::malformed(format!("invalid DC magnitude category {size}")));
    }
    *predictor += reader.receive_extend(size)?;
    block[0] = to_coefficient(*predictor)?;

    let mut k = 1;
    while k < 64 {
        let symbol = reader.decode(ac_table)?;
        let run = (symbol >> 4) as usize;
        let size = symbol & 0x0F;
        match (run, size) {
            (0, 0) => break,
            (15, 0) => k += 16,
            (_, 0) => return Err(JpegError::malformed(format!("invalid AC symbol 0x{symbol:02X}"))),
            _ => {
                k += run;
                if k >= 64 {
                    return Err(JpegError::malformed("AC run past the end of the block"));
                }
                block[k] = to_coefficient(reader.receive_extend(size)?)?;
                k += 1;
            }
        }
    }
    if k > 64 {
        return Err(JpegError::malformed("zero run past the end of the block"));
    }
    Ok(())
}

fn to_coefficient(value: i32) -> Result<i16> {
    i16::try_from(value).map_err(|_| JpegError::malformed("coefficient out of range"))
}

/// Receiver of the entropy coder output.
pub(crate) trait EntropySink {
    fn dc_symbol(&mut self, table: usize, symbol: u8) -> Result<()>;
    fn ac_symbol(&mut self, table: usize, symbol: u8) -> Result<()>;
    fn bits(&mut self, value: u16, count: u8);
    fn restart(&mut self, index: u8);
}

/// Counts symbol usage per table, for optimal table generation.
pub(crate) struct SymbolStatistics {
    pub dc: [[u32; 256]; 4],
    pub ac: [[u32; 256]; 4],
}

impl Default for SymbolStatistics {
    fn default() -> Self {
        SymbolStatistics {
            dc: [[0; 256]; 4],
            ac: [[0; 256]; 4],
        }
    }
}

impl EntropySink for SymbolStatistics {
    fn dc_symbol(&mut self, table: usize, symbol: u8) -> Result<()> {
        self.dc[table][symbol as usize] += 1;
        Ok(())
    }

    fn ac_symbol(&mut self, table: usize, symbol: u8) -> Result<()> {
        self.ac[table][symbol as usize] += 1;
        Ok(())
    }

    fn bits(&mut self, _value: u16, _count: u8) {}

    fn restart(&mut self, _index: u8) {}
}

/// Writes the entropy coded scan.
pub(crate) struct ScanWriter {
    writer: BitWriter,
    dc: Vec<Option<HuffmanEncoder>>,
    ac: Vec<Option<HuffmanEncoder>>,
}

impl ScanWriter {
    pub(crate) fn new(
        dc_tables: &[Option<HuffmanTable>; 4],
        ac_tables: &[Option<HuffmanTable>; 4],
        size_hint: usize,
    ) -> Result<Self> {
        let encoders = |tables: &[Option<HuffmanTable>; 4]| {
            tables
                .iter()
                .map(|t| t.as_ref().map(HuffmanEncoder::new).transpose())
                .collect::<Result<Vec<_>>>()
        };
        Ok(ScanWriter {
            writer: BitWriter::with_capacity(size_hint),
            dc: encoders(dc_tables)?,
            ac: encoders(ac_tables)?,
        })
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }
}

fn write_symbol(writer: &mut BitWriter, encoder: Option<&HuffmanEncoder>, symbol: u8) -> Result<()> {
    let encoder = encoder.ok_or_else(|| JpegError::malformed("undefined Huffman table"))?;
    let (code, len) = encoder.code(symbol)?;
    writer.write_bits(code, len);
    Ok(())
}

impl EntropySink for ScanWriter {
    fn dc_symbol(&mut self, table: usize, symbol: u8) -> Result<()> {
        write_symbol(&mut self.writer, self.dc[table].as_ref(), symbol)
    }

    fn ac_symbol(&mut self, table: usize, symbol: u8) -> Result<()> {
        write_symbol(&mut self.writer, self.ac[table].as_ref(), symbol)
    }

    fn bits(&mut self, value: u16, count: u8) {
        self.writer.write_bits(value, count);
    }

    fn restart(&mut self, index: u8) {
        self.writer.restart_marker(index);
    }
}

/// Run the entropy coder over all blocks, feeding `sink`.
pub(crate) fn encode_scan<S: EntropySink>(
    frame: &FrameInfo,
    components: &[ComponentCoefficients],
    restart_interval: u16,
    sink: &mut S,
) -> Result<()> {
    let layout = ScanLayout::new(frame);
    let ids = table_ids(frame);
    let mut predictors = vec![0i32; ids.len()];
    let interval = restart_interval as usize;

    for mcu in 0..layout.mcu_count() {
        if interval > 0 && mcu > 0 && mcu % interval == 0 {
            sink.restart(((mcu / interval - 1) % 8) as u8);
            predictors.fill(0);
        }
        layout.visit_mcu(mcu, |component, block| {
            encode_block(
                sink,
                components[component].block(block),
                ids[component],
                &mut predictors[component],
            )
        })?;
    }
    Ok(())
}

fn encode_block<S: EntropySink>(
    sink: &mut S,
    block: &[i16],
    ids: TableIds,
    predictor: &mut i32,
) -> Result<()> {
    let value = i32::from(block[0]);
    let (size, bits) = encode_coefficient(value - *predictor);
    *predictor = value;
    if size > 11 {
        return Err(JpegError::malformed("DC difference out of range"));
    }
    sink.dc_symbol(ids.dc, size)?;
    sink.bits(bits, size);

    let mut run = 0u8;
    for &coefficient in &block[1..] {
        if coefficient == 0 {
            run += 1;
            continue;
        }
        while run >= 16 {
            sink.ac_symbol(ids.ac, 0xF0)?;
            run -= 16;
        }
        let (size, bits) = encode_coefficient(i32::from(coefficient));
        if size > 10 {
            return Err(JpegError::malformed("AC coefficient out of range"));
        }
        sink.ac_symbol(ids.ac, (run << 4) | size)?;
        sink.bits(bits, size);
        run = 0;
    }
    if run > 0 {
        sink.ac_symbol(ids.ac, 0x00)?;
    }
    Ok(())
}
