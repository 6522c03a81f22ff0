use elvis_tcp::{ByteStream, Reassembler};
use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};

fn reassembler(capacity: u64) -> Reassembler {
    Reassembler::new(ByteStream::new(capacity))
}

#[test]
fn out_of_order_last_span_closes() {
    let mut r = reassembler(7);
    r.insert(3, "efgh", false);
    assert_eq!(r.bytes_pending(), 4);
    r.insert(0, "abc", true);
    assert_eq!(r.bytes_pending(), 0);
    assert_eq!(r.reader().read_to_end(), b"abc");
    assert!(r.output().is_finished());
}

#[test]
fn full_coverage_closes() {
    let mut r = reassembler(7);
    r.insert(3, "defg", true);
    assert_eq!(r.bytes_pending(), 4);
    r.insert(0, "abc", false);
    assert_eq!(r.bytes_pending(), 0);
    assert_eq!(r.reader().read_to_end(), b"abcdefg");
    assert!(r.output().is_finished());
}

#[test]
fn repeated_insert_is_idempotent() {
    let mut r = reassembler(100);
    r.insert(5, "fghij", false);
    r.insert(5, "fghij", false);
    r.insert(6, "gh", false);
    assert_eq!(r.bytes_pending(), 5);

    r.insert(0, "abcde", false);
    r.insert(0, "abcde", false);
    assert_eq!(r.output().bytes_pushed(), 10);
    assert_eq!(r.bytes_pending(), 0);
    assert_eq!(r.reader().read_to_end(), b"abcdefghij");
}

#[test]
fn capacity_limits_acceptance() {
    let mut r = reassembler(4);
    r.insert(0, "abcdef", false);
    assert_eq!(r.output().bytes_pushed(), 4);
    r.insert(4, "ef", true);
    assert_eq!(r.output().bytes_pushed(), 4);
    assert!(!r.output().is_closed());

    assert_eq!(r.reader().read_to_end(), b"abcd");
    r.insert(4, "ef", true);
    assert_eq!(r.reader().read_to_end(), b"ef");
    assert!(r.output().is_finished());
}

#[test]
fn random_permutations_reassemble() {
    const LEN: usize = 20_000;
    let mut rng = SmallRng::seed_from_u64(0xBAD5EED);

    for _ in 0..20 {
        let data: Vec<u8> = (0..LEN).map(|_| rng.gen()).collect();

        // Contiguous pieces that cover the stream, plus overlapping extras
        let mut spans = Vec::new();
        let mut start = 0;
        while start < LEN {
            let end = (start + rng.gen_range(1..1000)).min(LEN);
            spans.push((start, end));
            start = end;
        }
        for _ in 0..spans.len() / 2 {
            let start = rng.gen_range(0..LEN);
            let end = (start + rng.gen_range(0..2000)).min(LEN);
            spans.push((start, end));
        }
        spans.shuffle(&mut rng);

        let mut r = reassembler(LEN as u64);
        for (start, end) in spans {
            r.insert(start as u64, &data[start..end], end == LEN);
            assert!(r.bytes_pending() + r.output().bytes_pushed() <= LEN as u64);
        }

        assert_eq!(r.bytes_pending(), 0);
        assert_eq!(r.reader().read_to_end(), data);
        assert!(r.output().is_finished());
    }
}
