
/// One step of a global pairwise alignment between an original and an altered sequence
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlignOp {
    /// Bases agree
    Match,
    /// Bases disagree (substitution)
    Mismatch,
    /// A base present only in the altered sequence
    Insertion,
    /// A base present only in the original sequence
    Deletion
}

/// Returns the edit distance between two u8 slices by doing the full grid calculation.
/// This version is row-based (rows are length of v1) for the main loop.
/// # Arguments
/// * `v1` - the first sequence
/// * `v2` - the second sequence
pub fn edit_distance(v1: &[u8], v2: &[u8]) -> usize {
    // structured such that each "row" is the length of v1 (i.e. v1 is conceptually on the x-axis)
    let l1: usize = v1.len();
    let mut row: Vec<usize> = vec![0; l1+1];
    let mut prev_row: Vec<usize> = (0..l1+1).collect();

    // go through each row
    for (i, &c2) in v2.iter().enumerate() {
        row[0] = i+1;
        for (j, &c1) in v1.iter().enumerate() {
            row[j+1] = [
                // skip a character in v2
                prev_row[j+1]+1,
                // skip a character in v1
                row[j]+1,
                // diagonal match/mismatch
                prev_row[j]+({
                    if c1 == c2 {
                        0
                    } else {
                        1
                    }
                })
            ].into_iter().min().unwrap();
        }

        // swap the rows at the end of each iteration
        std::mem::swap(&mut row, &mut prev_row);
    }

    prev_row[l1]
}

/// Computes a unit-cost global alignment of `original` against `altered` and returns the operation stream.
/// Tie-breaks are fixed (diagonal, then deletion, then insertion) so the traceback is deterministic.
/// # Arguments
/// * `original` - the original sequence (deletions remove bases from here)
/// * `altered` - the altered sequence (insertions add bases from here)
pub fn global_align_ops(original: &[u8], altered: &[u8]) -> Vec<AlignOp> {
    let n = original.len();
    let m = altered.len();

    // full score grid; inputs here are whole contigs from small verification references
    let mut grid: Vec<Vec<usize>> = vec![vec![0; m+1]; n+1];
    for (i, grid_row) in grid.iter_mut().enumerate() {
        grid_row[0] = i;
    }
    for j in 0..=m {
        grid[0][j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let sub_cost = if original[i-1] == altered[j-1] { 0 } else { 1 };
            grid[i][j] = [
                grid[i-1][j-1] + sub_cost,
                grid[i-1][j] + 1,
                grid[i][j-1] + 1
            ].into_iter().min().unwrap();
        }
    }

    // walk back from the corner, preferring diagonal, then deletion, then insertion
    let mut ops: Vec<AlignOp> = Vec::with_capacity(n.max(m));
    let mut i = n;
    let mut j = m;
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let sub_cost = if original[i-1] == altered[j-1] { 0 } else { 1 };
            if grid[i][j] == grid[i-1][j-1] + sub_cost {
                ops.push(if sub_cost == 0 { AlignOp::Match } else { AlignOp::Mismatch });
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && grid[i][j] == grid[i-1][j] + 1 {
            ops.push(AlignOp::Deletion);
            i -= 1;
        } else {
            ops.push(AlignOp::Insertion);
            j -= 1;
        }
    }

    ops.reverse();
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    /// the op stream cost should always equal the independently computed edit distance
    fn op_cost(ops: &[AlignOp]) -> usize {
        ops.iter().filter(|op| !matches!(op, AlignOp::Match)).count()
    }

    #[test]
    fn test_edit_distance() {
        let v1: Vec<u8> = vec![0, 1, 2, 4, 5];
        let v2: Vec<u8> = vec![0, 1, 3, 4, 5];
        let v3: Vec<u8> = vec![1, 2, 3, 5];
        let v4: Vec<u8> = vec![];

        assert_eq!(edit_distance(&v1, &v1), 0);
        assert_eq!(edit_distance(&v1, &v2), 1);
        assert_eq!(edit_distance(&v1, &v3), 2);
        assert_eq!(edit_distance(&v1, &v4), 5);

        assert_eq!(edit_distance(&v2, &v2), 0);
        assert_eq!(edit_distance(&v2, &v3), 3);
        assert_eq!(edit_distance(&v2, &v4), 5);

        assert_eq!(edit_distance(&v3, &v3), 0);
        assert_eq!(edit_distance(&v3, &v4), 4);

        assert_eq!(edit_distance(&v4, &v4), 0);
    }

    #[test]
    fn test_align_identical() {
        let ops = global_align_ops(b"ACGT", b"ACGT");
        assert_eq!(ops, vec![AlignOp::Match; 4]);
    }

    #[test]
    fn test_align_substitution() {
        let ops = global_align_ops(b"ACGT", b"ATGT");
        assert_eq!(ops, vec![AlignOp::Match, AlignOp::Mismatch, AlignOp::Match, AlignOp::Match]);
        assert_eq!(op_cost(&ops), edit_distance(b"ACGT", b"ATGT"));
    }

    #[test]
    fn test_align_insertion() {
        let ops = global_align_ops(b"AC", b"AGGC");
        assert_eq!(op_cost(&ops), 2);
        assert_eq!(ops.iter().filter(|op| matches!(op, AlignOp::Insertion)).count(), 2);
        assert_eq!(op_cost(&ops), edit_distance(b"AC", b"AGGC"));
    }

    #[test]
    fn test_align_deletion() {
        let ops = global_align_ops(b"ACGTACGT", b"ACGT");
        assert_eq!(op_cost(&ops), 4);
        assert_eq!(ops.iter().filter(|op| matches!(op, AlignOp::Deletion)).count(), 4);
    }

    #[test]
    fn test_align_empty() {
        assert_eq!(global_align_ops(b"", b""), vec![]);
        assert_eq!(global_align_ops(b"AAA", b""), vec![AlignOp::Deletion; 3]);
        assert_eq!(global_align_ops(b"", b"TT"), vec![AlignOp::Insertion; 2]);
    }

    #[test]
    fn test_align_mixed() {
        // one SNP plus one deletion
        let original = b"AAACTTTGGG";
        let altered  = b"AAAGTTTGG";
        let ops = global_align_ops(original, altered);
        assert_eq!(op_cost(&ops), 2);
        assert_eq!(op_cost(&ops), edit_distance(original, altered));
    }
}
