//! Random-position verifier (C5): confirms a written test file's header and
//! a reproducible, seeded sample of body offsets read back unchanged.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use fdcore::error::CoreError;
use fdcore::pattern::{expected_pattern_slice, SAMPLE_LEN};
use fdcore::plan::{PlanId, VerifySample};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Verifies `path` against `header_line` and `positions` samples of
/// `SAMPLE_LEN` bytes each, drawn deterministically from `(plan_id,
/// file_index)`. Returns the header match and every sample drawn, in the
/// order they were drawn.
///
/// # Errors
///
/// Returns [`CoreError::Io`] if the file cannot be opened or read.
pub fn verify_test_file(
    path: &Path,
    header_line: &str,
    nominal_bytes: u64,
    plan_id: PlanId,
    file_index: u32,
    positions: u32,
) -> Result<(bool, Vec<VerifySample>), CoreError> {
    let mut file = File::open(path).map_err(|e| CoreError::io("open test file for verify", path, e))?;

    let header_len = (header_line.len() as u64).min(nominal_bytes) as usize;
    let mut header_buf = vec![0_u8; header_len];
    file.read_exact(&mut header_buf)
        .map_err(|e| CoreError::io("read header for verify", path, e))?;
    let header_ok = header_buf == header_line.as_bytes()[..header_len];

    let samples = draw_samples(
        &mut file,
        path,
        header_len as u64,
        nominal_bytes,
        plan_id,
        file_index,
        positions,
    )?;

    Ok((header_ok, samples))
}

fn draw_samples(
    file: &mut File,
    path: &Path,
    header_len: u64,
    nominal_bytes: u64,
    plan_id: PlanId,
    file_index: u32,
    positions: u32,
) -> Result<Vec<VerifySample>, CoreError> {
    let sample_len = SAMPLE_LEN as u64;
    if nominal_bytes <= header_len + sample_len {
        return Ok(Vec::new());
    }

    let span = nominal_bytes - header_len - sample_len;
    let mut rng = ChaCha8Rng::from_seed(plan_id.seed_for_file(file_index));

    let mut samples = Vec::with_capacity(positions as usize);
    for _ in 0..positions {
        let offset_in_span = rng.next_u64() % (span + 1);
        let file_offset = header_len + offset_in_span;

        file.seek(SeekFrom::Start(file_offset))
            .map_err(|e| CoreError::io("seek for verify sample", path, e))?;
        let mut observed = vec![0_u8; SAMPLE_LEN];
        file.read_exact(&mut observed)
            .map_err(|e| CoreError::io("read verify sample", path, e))?;

        let expected = expected_pattern_slice(file_offset, SAMPLE_LEN, header_len);
        samples.push(VerifySample {
            offset: file_offset,
            expected,
            observed,
        });
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdcore::naming::test_file_name;
    use fdcore::pattern::header_line;
    use std::fs::write;
    use time::OffsetDateTime;

    fn plan_id() -> PlanId {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        PlanId::derive(Path::new("/mnt/usb"), now)
    }

    fn write_well_formed_file(path: &Path, nominal_bytes: u64) {
        crate::writer::write_test_file(path, header_line(), nominal_bytes).unwrap();
    }

    #[test]
    fn verifies_header_and_samples_on_a_well_formed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(test_file_name(1, "01000000"));
        write_well_formed_file(&path, 100_000);

        let (header_ok, samples) = verify_test_file(&path, header_line(), 100_000, plan_id(), 1, 5).unwrap();
        assert!(header_ok);
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(VerifySample::ok));
    }

    #[test]
    fn detects_a_corrupted_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(test_file_name(2, "01000000"));
        write_well_formed_file(&path, 100_000);

        // Corrupt a byte well past the header.
        let mut data = std::fs::read(&path).unwrap();
        data[50_000] = b'!';
        write(&path, &data).unwrap();

        let (_, samples) = verify_test_file(&path, header_line(), 100_000, plan_id(), 2, 200).unwrap();
        assert!(samples.iter().any(|s| !s.ok()));
    }

    #[test]
    fn sampling_is_reproducible_for_the_same_plan_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(test_file_name(3, "01000000"));
        write_well_formed_file(&path, 100_000);

        let (_, first) = verify_test_file(&path, header_line(), 100_000, plan_id(), 3, 5).unwrap();
        let (_, second) = verify_test_file(&path, header_line(), 100_000, plan_id(), 3, 5).unwrap();
        let first_offsets: Vec<_> = first.iter().map(|s| s.offset).collect();
        let second_offsets: Vec<_> = second.iter().map(|s| s.offset).collect();
        assert_eq!(first_offsets, second_offsets);
    }

    #[test]
    fn tiny_files_draw_no_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(test_file_name(4, "01000000"));
        write_well_formed_file(&path, 10);

        let (header_ok, samples) = verify_test_file(&path, header_line(), 10, plan_id(), 4, 5).unwrap();
        assert!(header_ok);
        assert!(samples.is_empty());
    }
}
