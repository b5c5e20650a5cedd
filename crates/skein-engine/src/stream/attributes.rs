use std::ops::Range;

/// Flat, fixed-stride array of per-entity float attributes.
///
/// Sized once per update tick to the visible entity total; the backing
/// storage only ever grows (previous contents are not preserved across
/// `begin`, matching the streaming write pattern where every record is
/// rewritten each tick).
#[derive(Debug)]
pub struct AttributeBuffer {
    data: Vec<f32>,
    stride: usize,
    records: usize,
}

impl AttributeBuffer {
    pub fn new(stride: usize) -> Self {
        assert!(stride > 0);
        Self {
            data: Vec::new(),
            stride,
            records: 0,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Starts a tick that will write up to `total_records` records.
    pub fn begin(&mut self, total_records: usize) {
        let needed = total_records * self.stride;
        if self.data.len() < needed {
            self.data.resize(needed, 0.0);
        }
        self.records = 0;
    }

    /// Hands out the next record slot for writing.
    pub fn next_record(&mut self) -> &mut [f32] {
        let start = self.records * self.stride;
        self.records += 1;
        &mut self.data[start..start + self.stride]
    }

    /// Records written since the last `begin`.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Read access to a contiguous run of records.
    pub fn records(&self, range: Range<usize>) -> &[f32] {
        &self.data[range.start * self.stride..range.end * self.stride]
    }

    pub fn capacity_records(&self) -> usize {
        self.data.len() / self.stride
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_grows_but_never_shrinks() {
        let mut buffer = AttributeBuffer::new(4);
        buffer.begin(100);
        assert_eq!(buffer.capacity_records(), 100);

        buffer.begin(10);
        assert_eq!(buffer.capacity_records(), 100);

        buffer.begin(250);
        assert_eq!(buffer.capacity_records(), 250);
    }

    #[test]
    fn sequential_record_writes() {
        let mut buffer = AttributeBuffer::new(2);
        buffer.begin(3);

        buffer.next_record().copy_from_slice(&[1.0, 2.0]);
        buffer.next_record().copy_from_slice(&[3.0, 4.0]);
        assert_eq!(buffer.record_count(), 2);

        assert_eq!(buffer.records(0..2), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buffer.records(1..2), &[3.0, 4.0]);
    }
}
