//! 난수 소스: 엔진의 모든 무작위 결정을 하나의 스트림으로 통일합니다.
//!
//! 생성기, 분류기, 인터페이스 샘플링, 합성 게이지는 모두 [`RandomSource`]의
//! `next_f64()` 한 가지 연산에서 값을 얻습니다. 덕분에 테스트는
//! [`ScriptedRandom`]으로 정확한 시나리오를 재현할 수 있습니다.
//!
//! # 변환 규칙
//! - 균등 인덱스: `floor(r * len)`
//! - 확률 판정: `r < p`
//! - 정수 범위: `min + floor(r * span)`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `[0, 1)` 범위의 난수를 순서대로 제공하는 소스
pub trait RandomSource: Send {
    /// 다음 난수를 반환합니다. 항상 `[0, 1)` 범위입니다.
    fn next_f64(&mut self) -> f64;

    /// `[0, len)` 범위의 균등 인덱스를 뽑습니다.
    ///
    /// `len`이 0이어도 난수 하나를 소비하고 0을 반환합니다.
    fn index(&mut self, len: usize) -> usize {
        let r = self.next_f64();
        if len == 0 {
            return 0;
        }
        // r < 1 이므로 결과는 len 미만이지만, 부동소수점 경계를 위해 clamp
        ((r * len as f64) as usize).min(len - 1)
    }

    /// 슬라이스에서 균등하게 하나를 고릅니다.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        let idx = self.index(items.len());
        items.get(idx)
    }

    /// 확률 `p`로 `true`를 반환합니다.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// `[min, min + span)` 범위의 정수를 뽑습니다.
    fn range_u64(&mut self, min: u64, span: u64) -> u64 {
        let r = self.next_f64();
        min.saturating_add((r * span as f64) as u64)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// `rand::rngs::StdRng` 기반 운영용 난수 소스
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// OS 엔트로피로 초기화합니다.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// 고정 시드로 초기화합니다. 같은 시드는 같은 스트림을 만듭니다.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 설정의 시드 유무에 따라 생성합니다.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// 고정된 값 목록을 순환 재생하는 난수 소스 (테스트용)
///
/// 목록이 비어 있으면 항상 `0.0`을 반환합니다.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    position: usize,
    draws: u64,
}

impl ScriptedRandom {
    /// 값 목록으로 생성합니다. 각 값은 `[0, 1)` 범위로 잘립니다.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self {
            values,
            position: 0,
            draws: 0,
        }
    }

    /// 항상 같은 값을 반환하는 소스를 생성합니다.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// 지금까지 소비된 난수 개수
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position = (self.position + 1) % self.values.len();
        value
    }
}
