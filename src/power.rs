use tco::tco;

use crate::Word;

tco! {
    /// `x` raised to `y`. `power(x, 0)` is 1 for every `x`, zero included.
    pub fn power(x: Word, y: Word) -> Word {
        power_step(x, y, 1)
    }

    fn power_step(x: Word, y: Word, acc: Word) -> Word {
        if y == 0 {
            acc
        } else {
            power_step(x, y - 1, acc.wrapping_mul(x))
        }
    }
}
