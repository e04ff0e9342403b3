//! Seeded pseudo-random source. Layouts never touch a global RNG, so a seed fully determines
//! the result.

const MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;
const UNIT_BITS: u32 = 53;

/// xorshift64* stream. A zero seed is remapped to 1 since zero is a fixed point.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_bits(&mut self) -> u64 {
        let mut s = self.state;
        s ^= s >> 12;
        s ^= s << 25;
        s ^= s >> 27;
        self.state = s;
        s.wrapping_mul(MULTIPLIER)
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        let bits = self.next_bits() >> (64 - UNIT_BITS);
        bits as f64 / (1_u64 << UNIT_BITS) as f64
    }

    /// Uniform in `[-half, half)`.
    pub fn symmetric(&mut self, half: f64) -> f64 {
        (self.unit() * 2.0 - 1.0) * half
    }

    /// Uniform index below `len`; 0 when there is at most one choice.
    pub fn pick(&mut self, len: usize) -> usize {
        match len {
            0 | 1 => 0,
            _ => ((self.unit() * len as f64) as usize).min(len - 1),
        }
    }
}
