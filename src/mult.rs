use tco::tco;

use crate::Word;

tco! {
    /// `x * y` by adding `x` to itself `y` times.
    ///
    /// Takes `y` iterations, which makes it the depth test for the
    /// lowering: `mult(6, 123000)` would blow a recursive call stack.
    pub fn mult(x: Word, y: Word) -> Word {
        mult_step(x, y, 0)
    }

    fn mult_step(x: Word, y: Word, acc: Word) -> Word {
        if y == 0 {
            acc
        } else {
            mult_step(x, y - 1, acc.wrapping_add(x))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_times_anything() {
        for x in [0, 1, 6, Word::MAX] {
            assert_eq!(mult(x, 0), 0);
        }
        for y in [0, 1, 6, 1_000] {
            assert_eq!(mult(0, y), 0);
        }
    }

    #[test]
    fn small_products() {
        assert_eq!(mult(6, 7), 42);
        assert_eq!(mult(7, 6), 42);
        assert_eq!(mult(1, 1), 1);
    }

    #[test]
    fn deep_recurrence() {
        assert_eq!(mult(6, 123_000), 738_000);
    }

    #[test]
    fn wraps() {
        assert_eq!(mult(Word::MAX, 2), Word::MAX - 1);
        assert_eq!(mult(1 << 16, 1 << 16), 0);
    }

    #[test]
    fn engine_adds_onto_seed() {
        assert_eq!(mult_step(3, 0, 10), 10);
        assert_eq!(mult_step(3, 4, 10), 22);
    }
}
