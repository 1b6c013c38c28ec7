use std::io::Read;

use fitalloc::{SearchMode, calloc, free, malloc, print_memory, realloc, select_mode};

/// Waits until the user presses ENTER, unless `--no-wait` was given.
/// Useful when you want to inspect the process with `pmap` or `gdb` between
/// steps and watch the program break move.
fn pause(wait: bool) {
  if !wait {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break = {:?}",
    label,
    std::process::id(),
    fitalloc::Sbrk::current_break(),
  );
}

fn title(text: &str) {
  println!("\n\n== {} ==", text);
}

fn main() {
  let wait = !std::env::args().any(|arg| arg == "--no-wait");

  if let Some(mode) = std::env::args().find_map(|arg| match arg.as_str() {
    "--best-fit" => Some(SearchMode::BestFit),
    "--next-fit" => Some(SearchMode::NextFit),
    "--first-fit" => Some(SearchMode::FirstFit),
    _ => None,
  }) {
    select_mode(mode);
    println!("search mode: {:?}", mode);
  }

  print_program_break("start");
  pause(wait);

  unsafe {
    // Two released neighbours merge into one block big enough for both.
    title("malloc and free");
    let first = malloc(10);
    let second = malloc(8);
    let third = malloc(4);
    print_memory();

    println!("\nRelease blocks 1 and 2");
    free(first);
    free(second);
    print_memory();

    println!("\nAllocate a block of size block 1 + block 2");
    let merged = malloc(18);
    print_memory();
    free(merged);
    free(third);
    pause(wait);

    title("using a malloc-allocated array");
    let numbers = malloc(10 * std::mem::size_of::<i32>()) as *mut i32;
    for i in 0..10 {
      numbers.add(i).write(i as i32);
    }
    for i in 0..10 {
      print!("{}: {}\t", i, numbers.add(i).read());
    }
    println!();

    let numbers = realloc(numbers as *mut u8, 20 * std::mem::size_of::<i32>()) as *mut i32;
    println!("after realloc to 20 ints, element 9 = {}", numbers.add(9).read());
    free(numbers as *mut u8);
    pause(wait);

    // A large free block is carved into an exact fit and a free remainder.
    title("splitting");
    let big = malloc(64);
    free(big);
    let _a = malloc(8);
    let _b = malloc(8);
    print_memory();
    pause(wait);

    title("fragmentation");
    let a = malloc(16);
    let b = malloc(32);
    let c = malloc(16);
    free(b);
    let d = malloc(32);
    println!("freed block recycled? {}", if d == b { "yes" } else { "no" });
    free(a);
    free(c);
    free(d);
    print_memory();

    let zeroed = calloc(4, 8);
    println!("\ncalloc(4, 8) -> {:?}", zeroed);
    free(zeroed);
  }

  print_program_break("end");
  println!("\n{:#?}", fitalloc::global::stats());
}
