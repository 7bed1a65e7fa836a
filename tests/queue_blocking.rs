use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ls1024b_bridge::queue::{CommandQueue, Polled};
use ls1024b_bridge::Command;

fn cmd(m: &str) -> Command {
    Command::new(m).expect("mnemonic")
}

#[test]
fn fifo_order() {
    let q = CommandQueue::new();
    for m in ["A", "B", "C"] {
        q.push(cmd(m));
    }
    let popped: Vec<String> = (0..3)
        .filter_map(|_| q.pop_blocking())
        .map(|c| c.mnemonic().to_string())
        .collect();
    assert_eq!(popped, ["A", "B", "C"]);
    assert_eq!(q.pop_non_blocking(), Polled::Empty);
}

#[test]
fn blocked_consumer_receives_the_pushed_command() {
    let q = Arc::new(CommandQueue::new());
    let consumer = {
        let q = Arc::clone(&q);
        thread::spawn(move || q.pop_blocking())
    };
    thread::sleep(Duration::from_millis(50));
    q.push(cmd("LDON").with_int(7));
    let got = consumer.join().expect("consumer thread").expect("a command");
    assert_eq!(got.mnemonic(), "LDON");
    assert_eq!(got.int_param, 7);
    assert!(q.is_empty());
}

#[test]
fn many_producers_lose_and_duplicate_nothing() {
    const PRODUCERS: i64 = 4;
    const PER_PRODUCER: i64 = 250;

    let q = Arc::new(CommandQueue::new());
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    q.push(cmd("BC").with_int(p * 1000 + i));
                }
            })
        })
        .collect();

    let mut last_seen = vec![-1i64; usize::try_from(PRODUCERS).expect("small")];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let c = q.pop_blocking().expect("command");
        let producer = usize::try_from(c.int_param / 1000).expect("producer index");
        let seq = c.int_param % 1000;
        // each producer's commands come out in the order it pushed them
        assert!(seq > last_seen[producer]);
        last_seen[producer] = seq;
    }
    for p in producers {
        p.join().expect("producer thread");
    }
    assert!(last_seen.iter().all(|&s| s == PER_PRODUCER - 1));
    assert!(q.is_empty());
}

#[test]
fn stop_marker_wakes_a_waiting_consumer() {
    let q = Arc::new(CommandQueue::new());
    let consumer = {
        let q = Arc::clone(&q);
        thread::spawn(move || q.pop_blocking())
    };
    thread::sleep(Duration::from_millis(20));
    q.push_stop();
    assert!(consumer.join().expect("consumer thread").is_none());
}

#[test]
fn non_blocking_pop_takes_the_head() {
    let q = CommandQueue::new();
    q.push(cmd("LDON"));
    q.push(cmd("LDOFF"));
    assert_eq!(q.pop_non_blocking(), Polled::Command(cmd("LDON")));
    assert_eq!(q.len(), 1);
    assert_eq!(q.pop_non_blocking(), Polled::Command(cmd("LDOFF")));
    assert_eq!(q.pop_non_blocking(), Polled::Empty);
    q.push_stop();
    assert_eq!(q.pop_non_blocking(), Polled::Stopped);
    assert!(q.is_empty());
}

#[test]
fn each_command_reaches_exactly_one_consumer() {
    const CONSUMERS: usize = 4;
    const COMMANDS: i64 = 2000;

    let q = Arc::new(CommandQueue::new());
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                let mut got = Vec::new();
                while let Some(c) = q.pop_blocking() {
                    got.push(c.int_param);
                }
                got
            })
        })
        .collect();

    for i in 0..COMMANDS {
        q.push(cmd("BC").with_int(i));
    }
    for _ in 0..CONSUMERS {
        q.push_stop();
    }

    let mut all: Vec<i64> = consumers
        .into_iter()
        .flat_map(|h| h.join().expect("consumer thread"))
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..COMMANDS).collect::<Vec<_>>());
    assert!(q.is_empty());
}
