use tco::tco;

use crate::Word;

tco! {
    /// The `n`th Fibonacci number, counting `fib(0) = 0` and `fib(1) = 1`.
    pub fn fib(n: Word) -> Word {
        fib_step(n, 0, 1)
    }

    // (a, b) = (F(k), F(k + 1)) where k is how many steps have been taken
    fn fib_step(n: Word, a: Word, b: Word) -> Word {
        if n == 0 {
            a
        } else {
            fib_step(n - 1, b, a.wrapping_add(b))
        }
    }
}
