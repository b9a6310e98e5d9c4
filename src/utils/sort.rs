use num::Num;

/// u32-key radix sort for SoA (inds/vals).
/// - Sorts by inds ascending
/// - Reorders vals accordingly
/// - Stable: equal ids keep their input order
///
/// Complexity: 4 passes, each O(n + 256)
#[inline]
pub fn radix_sort_u32_soa<N>(inds: &mut [u32], vals: &mut [N])
where
    N: Num + Copy,
{
    assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }

    // 小さい入力は insertion sort の方が速い
    if n <= 32 {
        insertion_sort_u32_soa(inds, vals);
        return;
    }

    let mut inds_tmp = vec![0u32; n];
    let mut vals_tmp = vec![N::zero(); n];

    // LSD, byte 0..3
    for shift in [0u32, 8, 16, 24] {
        let mut count = [0usize; 256];
        for &k in inds.iter() {
            count[((k >> shift) & 0xFF) as usize] += 1;
        }

        // prefix sum -> starting positions
        let mut sum = 0usize;
        for c in count.iter_mut() {
            let tmp = *c;
            *c = sum;
            sum += tmp;
        }

        for idx in 0..n {
            let k = inds[idx];
            let b = ((k >> shift) & 0xFF) as usize;
            let pos = count[b];
            count[b] = pos + 1;
            inds_tmp[pos] = k;
            vals_tmp[pos] = vals[idx];
        }

        inds.copy_from_slice(&inds_tmp);
        vals.copy_from_slice(&vals_tmp);
    }
}

/// Tiny insertion sort for small n (SoA).
#[inline]
fn insertion_sort_u32_soa<N: Copy>(inds: &mut [u32], vals: &mut [N]) {
    let n = inds.len();
    for i in 1..n {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Collapse runs of equal ids in sorted SoA buffers by summing their values,
/// then drop entries whose value is zero.
pub fn merge_sorted_u32_soa<N>(inds: &mut Vec<u32>, vals: &mut Vec<N>)
where
    N: Num + Copy,
{
    debug_assert_eq!(inds.len(), vals.len());
    let mut write = 0usize;
    let mut read = 0usize;
    while read < inds.len() {
        let id = inds[read];
        let mut acc = vals[read];
        read += 1;
        while read < inds.len() && inds[read] == id {
            acc = acc + vals[read];
            read += 1;
        }
        if acc != N::zero() {
            inds[write] = id;
            vals[write] = acc;
            write += 1;
        }
    }
    inds.truncate(write);
    vals.truncate(write);
}
