use crate::types::{InsarError, InsarResult};
use ndarray::{Array2, ArrayViewMut1, Axis};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Advisory cancellation flag shared between a caller and running kernels.
///
/// Kernels check it between row blocks; a cancelled call returns
/// `InsarError::Cancelled` and its partial output is dropped.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// How output rows are distributed over worker threads
#[derive(Debug, Clone)]
pub struct RowSchedule {
    /// Output rows per work item
    pub chunk_size: usize,
    /// Enable parallel processing
    pub enable_parallel: bool,
    /// Optional cancellation flag, checked between row blocks
    pub cancel: Option<CancelFlag>,
}

impl Default for RowSchedule {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            enable_parallel: true,
            cancel: None,
        }
    }
}

impl RowSchedule {
    /// Single-threaded schedule
    pub fn sequential() -> Self {
        Self {
            enable_parallel: false,
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |c| c.is_cancelled())
    }

    /// Fill every row of `output` with `row_fn(row_index, row)`.
    ///
    /// Row blocks are independent and write disjoint regions, so they may run
    /// in any order.
    pub fn fill_rows<T, F>(&self, output: &mut Array2<T>, row_fn: F) -> InsarResult<()>
    where
        T: Send + Sync,
        F: Fn(usize, ArrayViewMut1<T>) + Send + Sync,
    {
        let rows = output.nrows();
        let chunk_size = self.chunk_size.max(1);

        if self.enable_parallel && rows > chunk_size {
            self.fill_rows_parallel(output, chunk_size, &row_fn);
        } else {
            let chunks = output.axis_chunks_iter_mut(Axis(0), chunk_size);
            for (chunk_idx, mut chunk) in chunks.enumerate() {
                if self.is_cancelled() {
                    break;
                }
                let start_row = chunk_idx * chunk_size;
                for (local_row, row) in chunk.axis_iter_mut(Axis(0)).enumerate() {
                    row_fn(start_row + local_row, row);
                }
            }
        }

        if self.is_cancelled() {
            log::debug!("Row processing cancelled");
            return Err(InsarError::Cancelled);
        }
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn fill_rows_parallel<T, F>(&self, output: &mut Array2<T>, chunk_size: usize, row_fn: &F)
    where
        T: Send + Sync,
        F: Fn(usize, ArrayViewMut1<T>) + Send + Sync,
    {
        use rayon::prelude::*;

        log::debug!(
            "Processing {} rows in blocks of {} on {} threads",
            output.nrows(),
            chunk_size,
            rayon::current_num_threads()
        );

        output
            .axis_chunks_iter_mut(Axis(0), chunk_size)
            .into_par_iter()
            .enumerate()
            .for_each(|(chunk_idx, mut chunk)| {
                if self.is_cancelled() {
                    return;
                }
                let start_row = chunk_idx * chunk_size;
                for (local_row, row) in chunk.axis_iter_mut(Axis(0)).enumerate() {
                    row_fn(start_row + local_row, row);
                }
            });
    }

    #[cfg(not(feature = "parallel"))]
    fn fill_rows_parallel<T, F>(&self, output: &mut Array2<T>, chunk_size: usize, row_fn: &F)
    where
        T: Send + Sync,
        F: Fn(usize, ArrayViewMut1<T>) + Send + Sync,
    {
        // Fallback to sequential processing if parallel feature is not available
        for (chunk_idx, mut chunk) in output.axis_chunks_iter_mut(Axis(0), chunk_size).enumerate() {
            if self.is_cancelled() {
                return;
            }
            let start_row = chunk_idx * chunk_size;
            for (local_row, row) in chunk.axis_iter_mut(Axis(0)).enumerate() {
                row_fn(start_row + local_row, row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rows_sequential_and_parallel_agree() {
        fn fill(row: usize, mut out: ArrayViewMut1<f64>) {
            for (col, v) in out.iter_mut().enumerate() {
                *v = (row * 100 + col) as f64;
            }
        }

        let mut seq = Array2::<f64>::zeros((50, 7));
        RowSchedule::sequential().fill_rows(&mut seq, fill).unwrap();

        let mut par = Array2::<f64>::zeros((50, 7));
        let schedule = RowSchedule {
            chunk_size: 4,
            ..RowSchedule::default()
        };
        schedule.fill_rows(&mut par, fill).unwrap();

        assert_eq!(seq, par);
        assert_eq!(seq[[49, 6]], 4906.0);
    }

    #[test]
    fn test_cancelled_schedule() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let schedule = RowSchedule::default().with_cancel(cancel);

        let mut out = Array2::<f64>::zeros((10, 10));
        let result = schedule.fill_rows(&mut out, |_, mut row| row.fill(1.0));
        assert_eq!(result, Err(InsarError::Cancelled));
    }
}
