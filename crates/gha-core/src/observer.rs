//! Residual reporting hook.

/// Receives the residual signal after each extraction or joint refinement.
///
/// The slice is borrowed from the caller's buffer or the context's scratch
/// and is only valid for the duration of the call. It is invoked
/// synchronously on the analyzing thread; implementations must not retain it.
///
/// Any `FnMut(&[T])` closure is an observer, so per-observer state is simply
/// whatever the closure captures.
pub trait ResidualObserver<T> {
    /// Called with the current residual.
    fn on_residual(&mut self, residual: &[T]);
}

impl<T, F> ResidualObserver<T> for F
where
    F: FnMut(&[T]),
{
    fn on_residual(&mut self, residual: &[T]) {
        self(residual);
    }
}
