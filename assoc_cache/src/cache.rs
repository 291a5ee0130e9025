use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache dimensions {lines}x{ways} aren't powers of 2")]
    InvalidConfiguration { lines: usize, ways: usize },
    #[error("slot ({line}, {way}) out of range for {lines}x{ways} cache")]
    OutOfRange {
        line: usize,
        way: usize,
        lines: usize,
        ways: usize,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// `lines` x `ways` set-associative cache with FIFO replacement.
///
/// Slots are stored row-major in one buffer. A slot equal to `T::default()`
/// is empty, so addresses stored here must never be the default value.
pub struct Cache<T> {
    inner: Vec<T>,
    lines: usize,
    ways: usize,
    bit_mask: u32,
}

impl<T: Copy + Default> Cache<T> {
    pub fn new(lines: usize, ways: usize) -> Result<Self> {
        let invalid = CacheError::InvalidConfiguration { lines, ways };
        if !lines.is_power_of_two() || !ways.is_power_of_two() {
            return Err(invalid);
        }
        let Ok(bit_mask) = u32::try_from(lines - 1) else {
            return Err(invalid);
        };
        let Some(len) = lines.checked_mul(ways) else {
            return Err(invalid);
        };
        Ok(Self {
            inner: vec![T::default(); len],
            lines,
            ways,
            bit_mask,
        })
    }
}

impl<T> Cache<T> {
    pub fn lines(&self) -> usize {
        self.lines
    }
    pub fn ways(&self) -> usize {
        self.ways
    }
    /// mask selecting the line index from an address.
    pub fn mask(&self) -> u32 {
        self.bit_mask
    }

    fn row_major(&self, line: usize, way: usize) -> Result<usize> {
        if line >= self.lines || way >= self.ways {
            return Err(CacheError::OutOfRange {
                line,
                way,
                lines: self.lines,
                ways: self.ways,
            });
        }
        Ok(line * self.ways + way)
    }

    pub fn at(&self, line: usize, way: usize) -> Result<&T> {
        let index = self.row_major(line, way)?;
        Ok(&self.inner[index])
    }
    pub fn at_mut(&mut self, line: usize, way: usize) -> Result<&mut T> {
        let index = self.row_major(line, way)?;
        Ok(&mut self.inner[index])
    }

    /// all ways of `line`, most recent first.
    pub fn line(&self, line: usize) -> Result<&[T]> {
        let begin = self.row_major(line, 0)?;
        Ok(&self.inner[begin..begin + self.ways])
    }
}

impl<T: Copy + Into<u32>> Cache<T> {
    /// Places `addr` in way 0 of its line. Older entries move one way down
    /// and the occupant of the last way is evicted.
    pub fn insert(&mut self, addr: T) {
        // mask at 32 bits at least, whatever the width of `T`
        let set = (addr.into() & self.bit_mask) as usize;
        let begin = set * self.ways;
        let line = &mut self.inner[begin..begin + self.ways];
        line.copy_within(..self.ways - 1, 1);
        line[0] = addr;
    }
}

impl<T: Default + PartialEq> Cache<T> {
    /// number of non-empty slots.
    pub fn occupancy(&self) -> usize {
        let empty = T::default();
        self.inner.iter().filter(|&v| *v != empty).count()
    }
}

impl<T: fmt::Display> fmt::Display for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.inner.chunks(self.ways) {
            let mut iter = row.iter();
            if let Some(first) = iter.next() {
                write!(f, "{first}")?;
            }
            for v in iter {
                write!(f, " {v}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_power_of_two() {
        for lines in [1, 2, 4, 32, 1024] {
            for ways in [1, 2, 8, 64] {
                let c = Cache::<u16>::new(lines, ways).unwrap();
                assert_eq!(c.lines(), lines);
                assert_eq!(c.ways(), ways);
                assert_eq!(c.mask() as usize, lines - 1);
            }
        }
    }
    #[test]
    fn test_new_invalid() {
        for (lines, ways) in [(3, 2), (4, 6), (0, 4), (4, 0), (12, 12)] {
            assert_eq!(
                Cache::<u16>::new(lines, ways).err(),
                Some(CacheError::InvalidConfiguration { lines, ways })
            );
        }
    }
    #[test]
    fn test_new_overflow() {
        let (lines, ways) = (1 << 31, 1 << 33);
        assert_eq!(
            Cache::<u16>::new(lines, ways).err(),
            Some(CacheError::InvalidConfiguration { lines, ways })
        );
    }
    #[test]
    fn test_empty_after_new() {
        let c = Cache::<u16>::new(8, 4).unwrap();
        for i in 0..8 {
            for j in 0..4 {
                assert_eq!(*c.at(i, j).unwrap(), 0);
            }
        }
        assert_eq!(c.occupancy(), 0);
    }
    #[test]
    fn test_out_of_range() {
        let mut c = Cache::<u16>::new(4, 2).unwrap();
        assert!(matches!(c.at(4, 0), Err(CacheError::OutOfRange { .. })));
        assert!(matches!(c.at(0, 2), Err(CacheError::OutOfRange { .. })));
        assert!(matches!(c.at_mut(9, 9), Err(CacheError::OutOfRange { .. })));
        assert!(c.line(4).is_err());
        *c.at_mut(3, 1).unwrap() = 7;
        assert_eq!(c.line(3).unwrap(), &[0, 7]);
    }
    #[test]
    fn test_insert_fifo() {
        let mut c = Cache::<u16>::new(4, 4).unwrap();
        // all map to line 1
        let addrs = [0x11, 0x21, 0x31, 0x41, 0x51];
        for a in addrs {
            c.insert(a);
        }
        assert_eq!(c.line(1).unwrap(), &[0x51, 0x41, 0x31, 0x21]);
        assert!(!c.line(1).unwrap().contains(&0x11));
        assert_eq!(c.occupancy(), 4);
    }
    #[test]
    fn test_insert_direct_mapped() {
        let mut c = Cache::<u16>::new(2, 1).unwrap();
        c.insert(4);
        c.insert(6);
        assert_eq!(*c.at(0, 0).unwrap(), 6);
        assert_eq!(*c.at(1, 0).unwrap(), 0);
        assert_eq!(c.occupancy(), 1);
    }
    #[test]
    fn test_insert_scenario() {
        let mut c = Cache::<u16>::new(4, 2).unwrap();
        for a in [0x10, 0x20, 0x11] {
            c.insert(a);
        }
        assert_eq!(c.line(0).unwrap(), &[0x20, 0x10]);
        assert_eq!(c.line(1).unwrap(), &[0x11, 0]);
        assert_eq!(c.occupancy(), 3);
    }
    #[test]
    fn test_insert_high_address() {
        let mut c = Cache::<u16>::new(1 << 15, 1).unwrap();
        c.insert(0xffff);
        assert_eq!(*c.at(0x7fff, 0).unwrap(), 0xffff);
    }
    #[test]
    fn test_occupancy_non_decreasing() {
        let mut c = Cache::<u16>::new(8, 2).unwrap();
        let mut last = 0;
        for a in 1..100u16 {
            c.insert(a.wrapping_mul(37));
            let now = c.occupancy();
            assert!(now >= last && now <= 16);
            last = now;
        }
    }
    #[test]
    fn test_display() {
        let mut c = Cache::<u16>::new(2, 2).unwrap();
        c.insert(3);
        c.insert(5);
        assert_eq!(c.to_string(), "0 0\n5 3\n");
    }
}
