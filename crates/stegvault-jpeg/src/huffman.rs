//! Huffman tables and the bit level reader/writer of the entropy coded scan.

use crate::error::{JpegError, Result};

const LUT_BITS: u8 = 8;
const MAX_CODE_LEN: usize = 16;

/// A Huffman table as stored in a DHT segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    /// Number of codes of each length 1..=16.
    pub code_counts: [u8; 16],
    /// Symbols ordered by code length.
    pub values: Vec<u8>,
}

impl HuffmanTable {
    pub fn new(code_counts: [u8; 16], values: Vec<u8>) -> Result<Self> {
        let table = HuffmanTable {
            code_counts,
            values,
        };
        let (sizes, _) = table.canonical_codes()?;
        if sizes.len() != table.values.len() {
            return Err(JpegError::malformed("Huffman symbol count mismatch"));
        }
        Ok(table)
    }

    /// Build the optimal table for the given symbol frequencies, limited to
    /// 16 bit codes and never assigning the all-ones code (ITU T.81 Annex K.2).
    pub fn optimal(frequencies: &[u32; 256]) -> Result<Self> {
        // slot 256 is a reserved pseudo symbol that takes the all-ones code
        let mut freq = [0u64; 257];
        for (f, &count) in freq.iter_mut().zip(frequencies.iter()) {
            *f = u64::from(count);
        }
        if freq.iter().all(|&f| f == 0) {
            return Err(JpegError::malformed("Huffman table without any symbol"));
        }
        freq[256] = 1;

        let mut code_size = [0usize; 257];
        let mut others = [usize::MAX; 257];

        loop {
            // the two least frequent trees, ties resolved towards the higher symbol
            let mut c1 = None;
            let mut c2 = None;
            for i in 0..257 {
                if freq[i] == 0 {
                    continue;
                }
                if c1.map_or(true, |c: usize| freq[i] <= freq[c]) {
                    c2 = c1;
                    c1 = Some(i);
                } else if c2.map_or(true, |c: usize| freq[i] <= freq[c]) {
                    c2 = Some(i);
                }
            }
            let (Some(mut c1), Some(mut c2)) = (c1, c2) else {
                break;
            };

            freq[c1] += freq[c2];
            freq[c2] = 0;

            code_size[c1] += 1;
            while others[c1] != usize::MAX {
                c1 = others[c1];
                code_size[c1] += 1;
            }
            others[c1] = c2;

            code_size[c2] += 1;
            while others[c2] != usize::MAX {
                c2 = others[c2];
                code_size[c2] += 1;
            }
        }

        let mut bits = [0usize; 33];
        for &size in code_size.iter().filter(|&&s| s > 0) {
            if size > 32 {
                return Err(JpegError::malformed("Huffman code length overflow"));
            }
            bits[size] += 1;
        }

        // shorten codes longer than 16 bits
        for i in (MAX_CODE_LEN + 1..=32).rev() {
            while bits[i] > 0 {
                let mut j = i - 2;
                while bits[j] == 0 {
                    j -= 1;
                }
                bits[i] -= 2;
                bits[i - 1] += 1;
                bits[j + 1] += 2;
                bits[j] -= 1;
            }
        }

        // drop the reserved code from the longest length
        let mut longest = MAX_CODE_LEN;
        while bits[longest] == 0 {
            longest -= 1;
        }
        bits[longest] -= 1;

        let mut code_counts = [0u8; 16];
        for (count, &n) in code_counts.iter_mut().zip(bits[1..=MAX_CODE_LEN].iter()) {
            *count = n as u8;
        }

        let mut values = Vec::new();
        for size in 1..=32 {
            values.extend(
                (0..256)
                    .filter(|&symbol| code_size[symbol] == size)
                    .map(|symbol| symbol as u8),
            );
        }

        HuffmanTable::new(code_counts, values)
    }

    /// DHT payload of this table.
    pub fn to_dht_entry(&self, class: u8, id: u8, out: &mut Vec<u8>) {
        out.push((class << 4) | id);
        out.extend_from_slice(&self.code_counts);
        out.extend_from_slice(&self.values);
    }

    /// Code sizes and codes in symbol order (ITU T.81 Figures C.1 and C.2).
    fn canonical_codes(&self) -> Result<(Vec<u8>, Vec<u16>)> {
        let total: usize = self.code_counts.iter().map(|&n| n as usize).sum();
        if total > 256 {
            return Err(JpegError::malformed("Huffman table with more than 256 symbols"));
        }

        let mut sizes = Vec::with_capacity(total);
        let mut codes = Vec::with_capacity(total);
        let mut code = 0u32;
        for (len, &count) in (1..=MAX_CODE_LEN as u8).zip(self.code_counts.iter()) {
            for _ in 0..count {
                if code >= 1 << len {
                    return Err(JpegError::malformed("Huffman code space overflow"));
                }
                sizes.push(len);
                codes.push(code as u16);
                code += 1;
            }
            code <<= 1;
        }
        Ok((sizes, codes))
    }
}

/// Decoding view of a [`HuffmanTable`].
#[derive(Debug, Clone)]
pub struct HuffmanLookup {
    /// (symbol, length) for every 8 bit prefix whose code fits in 8 bits.
    lut: [(u8, u8); 1 << LUT_BITS],
    /// Largest code of each length, -1 when the length is unused.
    max_code: [i32; MAX_CODE_LEN + 1],
    /// Added to a code of the given length to get its index into `values`.
    value_offset: [i32; MAX_CODE_LEN + 1],
    values: Vec<u8>,
}

impl HuffmanLookup {
    pub fn new(table: &HuffmanTable) -> Result<Self> {
        let (sizes, codes) = table.canonical_codes()?;

        let mut lookup = HuffmanLookup {
            lut: [(0, 0); 1 << LUT_BITS],
            max_code: [-1; MAX_CODE_LEN + 1],
            value_offset: [0; MAX_CODE_LEN + 1],
            values: table.values.clone(),
        };

        for (index, (&len, &code)) in sizes.iter().zip(codes.iter()).enumerate() {
            let len_idx = len as usize;
            if lookup.max_code[len_idx] < 0 {
                lookup.value_offset[len_idx] = index as i32 - i32::from(code);
            }
            lookup.max_code[len_idx] = i32::from(code);

            if len <= LUT_BITS {
                let shift = LUT_BITS - len;
                let base = (code as usize) << shift;
                for entry in &mut lookup.lut[base..base + (1 << shift)] {
                    *entry = (table.values[index], len);
                }
            }
        }

        Ok(lookup)
    }
}

/// Encoding view of a [`HuffmanTable`]: symbol to (code, length).
#[derive(Debug, Clone)]
pub struct HuffmanEncoder {
    codes: [Option<(u16, u8)>; 256],
}

impl HuffmanEncoder {
    pub fn new(table: &HuffmanTable) -> Result<Self> {
        let (sizes, codes) = table.canonical_codes()?;
        let mut map = [None; 256];
        for ((&symbol, &len), &code) in table.values.iter().zip(sizes.iter()).zip(codes.iter()) {
            map[symbol as usize] = Some((code, len));
        }
        Ok(HuffmanEncoder { codes: map })
    }

    #[inline]
    pub fn code(&self, symbol: u8) -> Result<(u16, u8)> {
        self.codes[symbol as usize]
            .ok_or_else(|| JpegError::malformed(format!("symbol 0x{symbol:02X} has no Huffman code")))
    }
}

/// Reads bits from byte stuffed entropy coded data.
///
/// Bits past the end of a restart interval (or of the data) read as ones,
/// consuming them is an error.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Left aligned bit buffer.
    bits: u64,
    count: u32,
    /// Trailing padding bits inside `bits`.
    padding: u32,
    at_marker: bool,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            pos: 0,
            bits: 0,
            count: 0,
            padding: 0,
            at_marker: false,
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        if self.at_marker {
            return None;
        }
        loop {
            let byte = *self.data.get(self.pos)?;
            if byte != 0xFF {
                self.pos += 1;
                return Some(byte);
            }
            match self.data.get(self.pos + 1) {
                Some(0x00) => {
                    self.pos += 2;
                    return Some(0xFF);
                }
                Some(0xFF) => self.pos += 1,
                _ => {
                    self.at_marker = true;
                    return None;
                }
            }
        }
    }

    fn fill(&mut self) {
        while self.count <= 56 {
            let byte = match self.next_byte() {
                Some(byte) => byte,
                None => {
                    self.padding += 8;
                    0xFF
                }
            };
            self.bits |= u64::from(byte) << (56 - self.count);
            self.count += 8;
        }
    }

    #[inline]
    fn peek(&mut self, count: u8) -> u16 {
        self.fill();
        (self.bits >> (64 - u32::from(count))) as u16
    }

    #[inline]
    fn consume(&mut self, count: u8) -> Result<()> {
        let count = u32::from(count);
        self.bits <<= count;
        self.count -= count;
        if self.count < self.padding {
            return Err(JpegError::UnexpectedEndOfScan);
        }
        Ok(())
    }

    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        if count == 0 {
            return Ok(0);
        }
        let value = self.peek(count);
        self.consume(count)?;
        Ok(value)
    }

    pub fn decode(&mut self, table: &HuffmanLookup) -> Result<u8> {
        let peek = self.peek(MAX_CODE_LEN as u8);

        let (symbol, len) = table.lut[(peek >> (16 - LUT_BITS)) as usize];
        if len > 0 {
            self.consume(len)?;
            return Ok(symbol);
        }

        for len in LUT_BITS as usize + 1..=MAX_CODE_LEN {
            let code = i32::from(peek >> (MAX_CODE_LEN - len));
            if code <= table.max_code[len] {
                self.consume(len as u8)?;
                let index = (code + table.value_offset[len]) as usize;
                return table
                    .values
                    .get(index)
                    .copied()
                    .ok_or_else(|| JpegError::malformed("Huffman value index out of range"));
            }
        }

        Err(JpegError::malformed("invalid Huffman code"))
    }

    /// Read `size` bits and sign extend them (ITU T.81 Figure F.12).
    pub fn receive_extend(&mut self, size: u8) -> Result<i32> {
        if size == 0 {
            return Ok(0);
        }
        let value = i32::from(self.read_bits(size)?);
        if value < 1 << (size - 1) {
            Ok(value - (1 << size) + 1)
        } else {
            Ok(value)
        }
    }

    /// Drop the partial byte of the finished interval and step over the RST marker.
    pub fn restart(&mut self) -> Result<()> {
        self.bits = 0;
        self.count = 0;
        self.padding = 0;
        self.at_marker = false;

        loop {
            match (self.data.get(self.pos), self.data.get(self.pos + 1)) {
                (Some(0xFF), Some(0xFF)) => self.pos += 1,
                (Some(0xFF), Some(0xD0..=0xD7)) => {
                    self.pos += 2;
                    return Ok(());
                }
                _ => return Err(JpegError::malformed("missing restart marker")),
            }
        }
    }
}

/// Writes bits MSB first with byte stuffing.
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bits: u32,
    count: u8,
}

impl BitWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        BitWriter {
            data: Vec::with_capacity(capacity),
            bits: 0,
            count: 0,
        }
    }

    #[inline]
    pub fn write_bits(&mut self, value: u16, count: u8) {
        if count == 0 {
            return;
        }
        let mask = (1u32 << count) - 1;
        self.bits = (self.bits << count) | (u32::from(value) & mask);
        self.count += count;

        while self.count >= 8 {
            self.count -= 8;
            let byte = (self.bits >> self.count) as u8;
            self.push_stuffed(byte);
        }
        self.bits &= (1u32 << self.count) - 1;
    }

    fn push_stuffed(&mut self, byte: u8) {
        self.data.push(byte);
        if byte == 0xFF {
            self.data.push(0x00);
        }
    }

    /// Pad the pending bits with ones up to the byte boundary.
    pub fn align(&mut self) {
        if self.count > 0 {
            let padding = 8 - self.count;
            self.write_bits((1 << padding) - 1, padding);
        }
    }

    /// Align and append an RST marker.
    pub fn restart_marker(&mut self, index: u8) {
        self.align();
        self.data.push(0xFF);
        self.data.push(0xD0 + (index & 0x07));
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.align();
        self.data
    }
}

/// Magnitude category and appended bits of a coefficient (inverse of
/// [`BitReader::receive_extend`]).
#[inline]
pub fn encode_coefficient(value: i32) -> (u8, u16) {
    if value == 0 {
        return (0, 0);
    }
    let magnitude = value.unsigned_abs();
    let size = (32 - magnitude.leading_zeros()) as u8;
    let bits = if value < 0 {
        (1u32 << size) - 1 - magnitude
    } else {
        magnitude
    };
    (size, bits as u16)
}
