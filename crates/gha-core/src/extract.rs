//! Sequential tone extraction by residual subtraction.

use crate::context::GhaContext;
use crate::error::Result;
use crate::info::HarmonicInfo;
use crate::sample::Sample;

impl<T: Sample> GhaContext<T> {
    /// Estimate the dominant tone and subtract it from `pcm` in place.
    ///
    /// The registered observer, if any, then sees the updated `pcm`.
    pub fn extract_one(&mut self, pcm: &mut [T]) -> Result<HarmonicInfo<T>> {
        let info = self.analyze_one(pcm)?;
        let magnitude = info.magnitude;

        for (x, &regen) in pcm.iter_mut().zip(&self.scratch) {
            *x = *x - regen * magnitude;
        }

        self.notify(pcm);
        Ok(info)
    }

    /// Extract `k` tones one after another, each from the residual of the previous.
    pub fn extract_many(&mut self, pcm: &mut [T], k: usize) -> Result<Vec<HarmonicInfo<T>>> {
        let mut tones = Vec::with_capacity(k);
        for _ in 0..k {
            tones.push(self.extract_one(pcm)?);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            count = tones.len(),
            residual = crate::info::residual_energy(pcm),
            "extracted tones"
        );

        Ok(tones)
    }

    /// Extract `k` tones, then jointly refine them against the original frame.
    ///
    /// Tones are returned sorted by ascending frequency. On success `pcm`
    /// holds the residual of the refined set.
    pub fn extract_many_adjusted(
        &mut self,
        pcm: &mut [T],
        k: usize,
    ) -> Result<Vec<HarmonicInfo<T>>> {
        self.check_len(pcm.len())?;
        let original = pcm.to_vec();

        let mut tones = self.extract_many(pcm, k)?;
        tones.sort_by(|a, b| a.frequency.widen().total_cmp(&b.frequency.widen()));
        if tones.is_empty() {
            return Ok(tones);
        }

        self.adjust_info(&original, &mut tones)?;
        pcm.copy_from_slice(&self.scratch);
        Ok(tones)
    }
}
