use tco::tco;

use crate::Word;

tco! {
    /// `x * (x + 1) * ... * y`, both ends included.
    ///
    /// An empty range (`x > y`) has product 1.
    pub fn product(x: Word, y: Word) -> Word {
        if x > y {
            1
        } else {
            product_step(x, y, 1)
        }
    }

    fn product_step(current: Word, y: Word, acc: Word) -> Word {
        if current > y {
            acc
        } else {
            let acc = acc.wrapping_mul(current);
            match current.checked_add(1) {
                Some(next) => product_step(next, y, acc),
                // the range ends at Word::MAX
                None => acc,
            }
        }
    }
}
