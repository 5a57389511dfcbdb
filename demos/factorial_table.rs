use tailrec::fact;

fn main() {
    // everything past 12! has wrapped around
    for i in 0..35 {
        println!("{}! = {}", i, fact(i));
    }
}
