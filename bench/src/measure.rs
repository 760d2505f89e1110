use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;

use acdat::{Builder, Statistics};

use clap::Parser;
use log::info;

const TRIALS: usize = 10;
const QUERIES: usize = 1000;

#[derive(Parser, Debug)]
#[clap(name = "measure", about = "A program to measure the performance.")]
struct Args {
    #[clap(short = 'k', long)]
    keys_filename: String,

    #[clap(short = 't', long)]
    texts_filename: Option<String>,

    #[clap(long, default_value = "1024")]
    initial_capacity: usize,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    println!("keys_filename: {}", &args.keys_filename);
    let keys = load_file(&args.keys_filename);
    let queries = random_sample(&keys);
    let texts = args.texts_filename.map(|texts_filename| {
        println!("texts_filename: {}", &texts_filename);
        load_file(&texts_filename)
    });

    println!("#keys: {}", keys.len());
    let records = || keys.iter().enumerate().map(|(i, k)| (k, i as u32));

    {
        println!("[acdat/charwise]");
        let start = Instant::now();
        let pma: acdat::CharwiseAutomaton<u32> = Builder::new()
            .initial_capacity(args.initial_capacity)
            .build(records())
            .unwrap();
        let duration = start.elapsed();
        info!("built the charwise automaton of {} states", pma.size());
        print_statistics(&pma);
        println!("construction: {:.3} [sec]", duration.as_secs_f64());

        let bytes = pma.serialize_to_vec();
        println!("serialized: {} bytes", bytes.len());

        {
            let mut dummy = 0;
            let elapsed_sec = measure(TRIALS, || {
                for query in &queries {
                    dummy += *pma.exact_match(query).unwrap() as usize;
                }
            });
            println!(
                "exact_match: {:.3} [ns/query]",
                to_ns(elapsed_sec) / queries.len() as f64
            );
            println!("dummy: {}", dummy);
        }

        if let Some(texts) = texts.as_ref() {
            let mut dummy = 0;
            let elapsed_sec = measure(TRIALS, || {
                for text in texts {
                    pma.scan(text, |h| {
                        dummy += h.end() + *h.value() as usize;
                        ControlFlow::Continue(())
                    });
                }
            });
            println!(
                "scan: {:.3} [us/text]",
                to_us(elapsed_sec) / texts.len() as f64
            );
            println!("dummy: {}", dummy);
        }
    }

    {
        println!("[acdat/bytewise]");
        let start = Instant::now();
        let pma: acdat::BytewiseAutomaton<u32> = Builder::new()
            .initial_capacity(args.initial_capacity)
            .build(records())
            .unwrap();
        let duration = start.elapsed();
        info!("built the bytewise automaton of {} states", pma.size());
        print_statistics(&pma);
        println!("construction: {:.3} [sec]", duration.as_secs_f64());

        if let Some(texts) = texts.as_ref() {
            let mut dummy = 0;
            let elapsed_sec = measure(TRIALS, || {
                for text in texts {
                    pma.scan(text, |h| {
                        dummy += h.end() + *h.value() as usize;
                        ControlFlow::Continue(())
                    });
                }
            });
            println!(
                "scan: {:.3} [us/text]",
                to_us(elapsed_sec) / texts.len() as f64
            );
            println!("dummy: {}", dummy);
        }
    }

    {
        println!("[daachorse/charwise]");
        let start = Instant::now();
        let pma = daachorse::charwise::CharwiseDoubleArrayAhoCorasick::new(&keys).unwrap();
        let duration = start.elapsed();
        print_heap_bytes(pma.heap_bytes());
        println!("construction: {:.3} [sec]", duration.as_secs_f64());

        if let Some(texts) = texts.as_ref() {
            let mut dummy = 0;
            let elapsed_sec = measure(TRIALS, || {
                for text in texts {
                    for m in pma.find_overlapping_iter(text) {
                        dummy += m.end() + m.value() as usize;
                    }
                }
            });
            println!(
                "scan: {:.3} [us/text]",
                to_us(elapsed_sec) / texts.len() as f64
            );
            println!("dummy: {}", dummy);
        }
    }
}

fn print_statistics<S: Statistics>(stats: &S) {
    print_heap_bytes(stats.heap_bytes());
    println!("num_elems: {}", stats.num_elems());
    println!("num_vacants: {}", stats.num_vacants());
    println!("vacant_ratio: {:.3}", stats.vacant_ratio());
}

fn print_heap_bytes(bytes: usize) {
    println!(
        "heap_bytes: {} bytes, {:.3} MiB",
        bytes,
        bytes as f64 / (1024.0 * 1024.0)
    );
}

fn load_file<P>(path: P) -> Vec<String>
where
    P: AsRef<Path>,
{
    let file = File::open(path).unwrap();
    let buf = BufReader::new(file);
    buf.lines().map(|line| line.unwrap()).collect()
}

fn random_sample(keys: &[String]) -> Vec<String> {
    let mut rng = rand::thread_rng();
    rand::seq::sample_slice(&mut rng, keys, QUERIES.min(keys.len()))
}

fn measure<F>(num_trials: usize, mut func: F) -> f64
where
    F: FnMut(),
{
    // Warmup
    func();
    // Measure
    let start = Instant::now();
    for _ in 0..num_trials {
        func();
    }
    let duration = start.elapsed();
    duration.as_secs_f64() / num_trials as f64
}

fn to_us(sec: f64) -> f64 {
    sec * 1_000_000.
}

fn to_ns(sec: f64) -> f64 {
    sec * 1_000_000_000.
}
