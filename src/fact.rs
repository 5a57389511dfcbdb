use tco::tco;

use crate::Word;

tco! {
    /// `n!`, with `0! = 1`. Wraps past `12!`.
    pub fn fact(n: Word) -> Word {
        fact_step(n, 1)
    }

    fn fact_step(n: Word, acc: Word) -> Word {
        if n <= 1 {
            acc
        } else {
            fact_step(n - 1, acc.wrapping_mul(n))
        }
    }
}
