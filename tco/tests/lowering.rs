use std::cell::Cell;
use std::rc::Rc;

use tco::tco;

tco! {
    pub fn factorial(n: u128) -> u128 {
        fac(n, 1)
    }

    fn fac(n: u128, acc: u128) -> u128 {
        match n {
            0 => acc,
            _ => fac(n - 1, acc * n),
        }
    }
}

tco! {
    pub fn is_even(n: u64) -> bool {
        if n == 0 {
            true
        } else {
            is_odd(n - 1)
        }
    }

    fn is_odd(n: u64) -> bool {
        if n == 0 {
            false
        } else {
            is_even(n - 1)
        }
    }
}

tco! {
    /// Greatest common divisor, written with explicit returns.
    #[must_use]
    pub fn gcd(a: u64, b: u64) -> u64 {
        if b == 0 {
            return a;
        }
        return gcd(b, a % b);
    }
}

tco! {
    pub fn countdown(n: u32) -> u32 {
        tick(n, 0)
    }

    // the jump has to leave the inner `for`, not just restart it
    fn tick(n: u32, ticks: u32) -> u32 {
        for _ in 0..3 {
            if n > 0 {
                return tick(n - 1, ticks + 1);
            }
        }
        ticks
    }
}

tco! {
    pub fn spin(n: u32, counter: Rc<Cell<u32>>) {
        if n > 0 {
            counter.set(counter.get() + 1);
            spin(n - 1, counter)
        }
    }
}

tco! {
    pub fn sum_to(n: u64) -> u64 {
        sum_pairs((n, 0), 0)
    }

    fn sum_pairs((n, i): (u64, u64), mut acc: u64) -> u64 {
        if i > n {
            acc
        } else {
            acc += i;
            (sum_pairs((n, i + 1), acc))
        }
    }
}

tco! {
    pub fn last_digit(n: u64) -> u64 {
        { digits(n) }
    }

    fn digits(n: u64) -> u64 {
        if n < 10 {
            n
        } else if n % 10 == 0 {
            digits(n / 10)
        } else {
            n % 10
        }
    }
}

#[test]
fn match_arms_in_tail_position() {
    assert_eq!(factorial(0), 1);
    assert_eq!(factorial(5), 120);
    assert_eq!(factorial(34), 295232799039604140847618609643520000000);
}

#[test]
fn mutual_recursion_runs_a_million_deep() {
    assert!(is_even(1_000_000));
    assert!(!is_even(1_000_001));
}

#[test]
fn explicit_returns() {
    assert_eq!(gcd(48, 18), 6);
    assert_eq!(gcd(17, 5), 1);
    assert_eq!(gcd(0, 9), 9);
}

#[test]
fn return_from_inside_a_loop() {
    assert_eq!(countdown(0), 0);
    assert_eq!(countdown(100_000), 100_000);
}

#[test]
fn unit_groups() {
    let counter = Rc::new(Cell::new(0));
    spin(250_000, counter.clone());
    assert_eq!(counter.get(), 250_000);
}

#[test]
fn pattern_arguments_and_parens() {
    assert_eq!(sum_to(0), 0);
    assert_eq!(sum_to(100), 5050);
    assert_eq!(sum_to(1_000_000), 500_000_500_000);
}

#[test]
fn else_if_chains_and_blocks() {
    assert_eq!(last_digit(7), 7);
    assert_eq!(last_digit(1234), 4);
    assert_eq!(last_digit(5_000_000), 5);
}
