//! No-lookahead view over a run's candle arena.
//!
//! A [`History`] exposes bars `0..=cursor` of an arena that may extend further.
//! Indicator series are computed once per run over the whole arena and cached
//! in a [`SeriesCache`]; every supported operation is causal, so the value read
//! at the cursor equals the value computed over the visible prefix alone.
//! Candlestick patterns read all four price channels and are cached alongside.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::domain::aligned::AlignedSeries;
use crate::domain::candle::{closes, Candle};
use crate::domain::error::TradesimError;
use crate::domain::indicator::{IndicatorField, IndicatorOp, PatternOp};
use crate::domain::indicator_adapter::IndicatorAdapter;
use crate::ports::indicator_port::OhlcInput;

/// Per-run cache of aligned indicator outputs over the arena's price channels.
#[derive(Debug)]
pub struct SeriesCache {
    opens: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
    closes: Vec<f64>,
    series: RefCell<HashMap<IndicatorOp, Rc<[AlignedSeries]>>>,
    patterns: RefCell<HashMap<PatternOp, Rc<AlignedSeries>>>,
}

impl SeriesCache {
    pub fn new(arena: &[Candle]) -> Self {
        Self {
            opens: arena.iter().map(|c| c.open).collect(),
            highs: arena.iter().map(|c| c.high).collect(),
            lows: arena.iter().map(|c| c.low).collect(),
            closes: closes(arena),
            series: RefCell::new(HashMap::new()),
            patterns: RefCell::new(HashMap::new()),
        }
    }

    fn ohlc(&self) -> OhlcInput<'_> {
        OhlcInput {
            open: &self.opens,
            high: &self.highs,
            low: &self.lows,
            close: &self.closes,
        }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn outputs(
        &self,
        adapter: &IndicatorAdapter,
        op: &IndicatorOp,
    ) -> Result<Rc<[AlignedSeries]>, TradesimError> {
        if let Some(found) = self.series.borrow().get(op) {
            return Ok(Rc::clone(found));
        }
        let computed: Rc<[AlignedSeries]> = adapter.compute(op, &self.closes)?.into();
        self.series.borrow_mut().insert(*op, Rc::clone(&computed));
        Ok(computed)
    }

    pub fn pattern(
        &self,
        adapter: &IndicatorAdapter,
        pattern: &PatternOp,
    ) -> Result<Rc<AlignedSeries>, TradesimError> {
        if let Some(found) = self.patterns.borrow().get(pattern) {
            return Ok(Rc::clone(found));
        }
        let computed = Rc::new(adapter.pattern(pattern, &self.ohlc())?);
        self.patterns.borrow_mut().insert(*pattern, Rc::clone(&computed));
        Ok(computed)
    }

    pub fn cached_ops(&self) -> usize {
        self.series.borrow().len() + self.patterns.borrow().len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    arena: &'a [Candle],
    cursor: usize,
    cache: &'a SeriesCache,
}

impl<'a> History<'a> {
    /// `cursor` is clamped to the last arena index.
    pub fn new(arena: &'a [Candle], cursor: usize, cache: &'a SeriesCache) -> Self {
        let cursor = cursor.min(arena.len().saturating_sub(1));
        Self {
            arena,
            cursor,
            cache,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of visible bars.
    pub fn len(&self) -> usize {
        if self.arena.is_empty() {
            0
        } else {
            self.cursor + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The visible prefix.
    pub fn bars(&self) -> &'a [Candle] {
        &self.arena[..self.len()]
    }

    pub fn current(&self) -> Option<&'a Candle> {
        self.bars().last()
    }

    /// Value of an indicator output `back` bars before the cursor;
    /// `None` while it is still warming up.
    pub fn indicator(
        &self,
        adapter: &IndicatorAdapter,
        op: &IndicatorOp,
        field: IndicatorField,
        back: usize,
    ) -> Result<Option<f64>, TradesimError> {
        if self.is_empty() {
            return Ok(None);
        }
        let index = field.output_index(op)?;
        let Some(at) = self.cursor.checked_sub(back) else {
            return Ok(None);
        };
        let outputs = self.cache.outputs(adapter, op)?;
        Ok(outputs.get(index).and_then(|s| s.get(at)))
    }

    /// Pattern score at the cursor; `None` before the pattern's lookback.
    pub fn pattern(
        &self,
        adapter: &IndicatorAdapter,
        pattern: &PatternOp,
    ) -> Result<Option<f64>, TradesimError> {
        if self.is_empty() {
            return Ok(None);
        }
        Ok(self.cache.pattern(adapter, pattern)?.get(self.cursor))
    }
}
