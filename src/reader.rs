//! Pull-based atom walker.
//!
//! [`AtomReader::next_atom`] hands out one [`AtomEvent`] at a time. Between two
//! calls the caller may consume the atom it was just given, with
//! [`AtomReader::read_current_text`], [`AtomReader::read_current_bytes`] or
//! [`AtomReader::skip_current`]. Whatever is left pending when `next_atom` is
//! called again gets the default treatment: containers are entered (and later
//! closed by a synthetic `CONTAINER_END` event), everything else is skipped.
//!
//! ```no_run
//! use mp4atoms::{AtomReader, FourCC};
//! use std::fs::File;
//!
//! let mut reader = AtomReader::new(File::open("movie.m4v")?);
//! while let Some(atom) = reader.next_atom()? {
//!     if atom.name == FourCC::TITLE {
//!         println!("title: {}", reader.read_current_text()?);
//!     }
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::atom::{AtomEvent, AtomFlags, ConsumeState, FourCC};
use crate::catalog::Catalog;
use crate::parser::{ParseError, Result, read_atom_header};
use crate::source::AtomSource;
use std::sync::Arc;

/// Bytes in front of the text of an iTunes tag: the nested `data` atom's
/// size, type and type/locale words.
pub const TAG_PREFIX_LEN: u64 = 16;

/// Bytes dropped at the start of a `SKIPPER` container (version and flags).
const SKIPPER_PREFIX_LEN: u64 = 4;

const READ_CHUNK: usize = 8 * 1024;

/// Containers a metadata search is allowed to enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    names: Vec<FourCC>,
}

impl SearchPath {
    pub fn new(names: impl IntoIterator<Item = FourCC>) -> Self {
        SearchPath { names: names.into_iter().collect() }
    }

    /// `moov` / `udta` / `meta` / `ilst`, where iTunes keeps its tags.
    pub fn itunes() -> Self {
        SearchPath::new([FourCC::MOOV, FourCC::UDTA, FourCC::META, FourCC::ILST])
    }

    pub fn contains(&self, name: &FourCC) -> bool {
        self.names.contains(name)
    }
}

impl Default for SearchPath {
    fn default() -> Self {
        SearchPath::itunes()
    }
}

/// One level of nesting being walked.
#[derive(Debug)]
struct Frame {
    /// Bytes this level may cover; `None` runs to end of stream.
    budget: Option<u64>,
    /// Bytes covered so far, counted in whole atoms.
    offset: u64,
    /// The atom whose children this level walks; `None` at the root.
    container: Option<AtomEvent>,
}

impl Frame {
    fn exhausted(&self) -> bool {
        self.budget.is_some_and(|b| self.offset >= b)
    }
}

/// Forward-only reader over a stream of atoms.
#[derive(Debug)]
pub struct AtomReader<S> {
    source: S,
    catalog: Arc<Catalog>,
    frames: Vec<Frame>,
    current: Option<AtomEvent>,
    state: ConsumeState,
    /// The current atom came from a header and its frame has not advanced past it yet.
    resume_pending: bool,
    position: u64,
    finished: bool,
}

impl<S: AtomSource> AtomReader<S> {
    /// Walk the whole stream with the built-in catalog.
    pub fn new(source: S) -> Self {
        Self::with_catalog(source, Catalog::standard())
    }

    pub fn with_catalog(source: S, catalog: impl Into<Arc<Catalog>>) -> Self {
        Self::build(source, catalog.into(), None)
    }

    /// Walk at most `budget` bytes of top-level atoms from the current position.
    pub fn bounded(source: S, budget: u64) -> Self {
        Self::build(source, Arc::new(Catalog::standard()), Some(budget))
    }

    fn build(source: S, catalog: Arc<Catalog>, budget: Option<u64>) -> Self {
        AtomReader {
            source,
            catalog,
            frames: vec![Frame { budget, offset: 0, container: None }],
            current: None,
            state: ConsumeState::Consumed,
            resume_pending: false,
            position: 0,
            finished: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The atom most recently handed out.
    pub fn current(&self) -> Option<&AtomEvent> {
        self.current.as_ref()
    }

    /// Whether the current atom is still open to a consuming call.
    pub fn current_state(&self) -> ConsumeState {
        self.state
    }

    /// Bytes read or skipped since the reader was created.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of containers currently entered.
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Advance to the next event.
    ///
    /// Applies the default action to the previous atom if the caller left it
    /// pending, then decodes the next header or closes the innermost
    /// container. `Ok(None)` once the stream (or root budget) is exhausted.
    /// Any error ends the walk.
    pub fn next_atom(&mut self) -> Result<Option<AtomEvent>> {
        if self.finished {
            return Ok(None);
        }
        let step = self.resume().and_then(|()| self.advance());
        if step.is_err() {
            self.finish();
        }
        step
    }

    /// Borrowing iterator that leaves every atom to the default action.
    pub fn events(&mut self) -> Events<'_, S> {
        Events { reader: self }
    }

    /// Read the current tag atom's text.
    ///
    /// Drops the 16-byte `data` prefix and decodes the rest as UTF-8, replacing
    /// invalid sequences. A short read yields whatever text arrived.
    pub fn read_current_text(&mut self) -> Result<String> {
        let atom = self.take_leaf()?;
        let prefix = atom.data_size.min(TAG_PREFIX_LEN);
        let bytes = self.guarded(|r| {
            r.skip_bytes(prefix)?;
            r.read_payload(atom.data_size - prefix)
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the current leaf atom's whole payload.
    pub fn read_current_bytes(&mut self) -> Result<Vec<u8>> {
        self.read_current_head(u64::MAX)
    }

    /// Read at most `limit` bytes of the current leaf's payload and skip the rest.
    pub fn read_current_head(&mut self, limit: u64) -> Result<Vec<u8>> {
        let atom = self.take_leaf()?;
        let keep = atom.data_size.min(limit);
        self.guarded(|r| {
            let bytes = r.read_payload(keep)?;
            if bytes.len() as u64 == keep {
                r.skip_bytes(atom.data_size - keep)?;
            }
            Ok(bytes)
        })
    }

    /// Skip the current atom's payload. A container skipped before the next
    /// `next_atom` call is not entered and produces no end event.
    pub fn skip_current(&mut self) -> Result<()> {
        let atom = self.take_pending()?;
        if atom.is_container_end() {
            return Ok(());
        }
        self.guarded(|r| r.skip_bytes(atom.data_size))
    }

    /// Text of the first `name` atom along the iTunes tag path.
    pub fn find_meta_value(&mut self, name: FourCC) -> Result<Option<String>> {
        self.find_meta_value_in(name, &SearchPath::itunes())
    }

    /// Search for `name`, only entering containers listed in `path`.
    ///
    /// The search stops at the first closing event of a listed container: an
    /// atom outside that exact chain is never found.
    pub fn find_meta_value_in(&mut self, name: FourCC, path: &SearchPath) -> Result<Option<String>> {
        while let Some(atom) = self.next_atom()? {
            if atom.name == name {
                return self.read_current_text().map(Some);
            }
            if atom.is_container() {
                if !path.contains(&atom.name) {
                    log::debug!("search for '{name}': pruning '{}'", atom.name);
                    self.skip_current()?;
                }
            } else if atom.is_container_end() && path.contains(&atom.name) {
                log::debug!("search for '{name}': '{}' closed without a match", atom.name);
                return Ok(None);
            }
        }
        Ok(None)
    }

    pub fn title(&mut self) -> Result<Option<String>> {
        self.find_meta_value(FourCC::TITLE)
    }

    pub fn synopsis(&mut self) -> Result<Option<String>> {
        self.find_meta_value(FourCC::SYNOPSIS)
    }

    fn finish(&mut self) {
        self.finished = true;
        self.frames.clear();
    }

    /// Run `f`, ending the walk if it fails.
    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let res = f(self);
        if res.is_err() {
            self.finish();
        }
        res
    }

    /// Finish the step started by the last header: move the frame past the
    /// atom and, unless the caller took it, enter or skip it.
    fn resume(&mut self) -> Result<()> {
        if !std::mem::take(&mut self.resume_pending) {
            return Ok(());
        }
        let Some(atom) = self.current.clone() else {
            return Ok(());
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.offset = frame.offset.saturating_add(atom.size);
        }
        if self.state == ConsumeState::Consumed {
            return Ok(());
        }
        self.state = ConsumeState::Consumed;

        if atom.is_container() {
            let mut budget = atom.data_size;
            if atom.flags.contains(AtomFlags::SKIPPER) {
                let prefix = budget.min(SKIPPER_PREFIX_LEN);
                self.skip_bytes(prefix)?;
                budget -= prefix;
            }
            log::debug!("enter '{}' at {} budget={budget}", atom.name, atom.offset);
            self.frames.push(Frame { budget: Some(budget), offset: 0, container: Some(atom) });
        } else {
            self.skip_bytes(atom.data_size)?;
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<AtomEvent>> {
        let Some(frame) = self.frames.last() else {
            self.finish();
            return Ok(None);
        };
        let header = if frame.exhausted() {
            None
        } else {
            read_atom_header(&mut self.source, &self.catalog)?
        };

        match header {
            Some(h) => {
                let offset = self.position;
                self.position = self.position.saturating_add(h.header_len);
                let event = AtomEvent {
                    name: h.name,
                    flags: h.flags,
                    size: h.size,
                    data_size: h.data_size(),
                    offset,
                    depth: self.depth(),
                };
                log::debug!("atom '{}' at {offset} size={} ({})", event.name, event.size, event.flags);
                self.offer(event.clone(), true);
                Ok(Some(event))
            }
            None => match self.frames.pop().and_then(|f| f.container) {
                Some(container) => {
                    log::debug!("leave '{}'", container.name);
                    let end = container.end_marker();
                    self.offer(end.clone(), false);
                    Ok(Some(end))
                }
                None => {
                    self.finish();
                    Ok(None)
                }
            },
        }
    }

    fn offer(&mut self, event: AtomEvent, resume: bool) {
        self.current = Some(event);
        self.state = ConsumeState::Pending;
        self.resume_pending = resume;
    }

    /// Check the consume-once protocol and mark the current atom consumed.
    fn take_pending(&mut self) -> Result<AtomEvent> {
        let atom = self.current.clone().ok_or(ParseError::NoCurrentAtom)?;
        if self.state == ConsumeState::Consumed {
            return Err(ParseError::AlreadyConsumed { name: atom.name });
        }
        self.state = ConsumeState::Consumed;
        Ok(atom)
    }

    fn take_leaf(&mut self) -> Result<AtomEvent> {
        if let Some(atom) = &self.current {
            if self.state == ConsumeState::Pending && (atom.is_container() || atom.is_container_end()) {
                return Err(ParseError::NoLeafData { name: atom.name });
            }
        }
        self.take_pending()
    }

    fn skip_bytes(&mut self, n: u64) -> Result<()> {
        if n > 0 {
            log::trace!("skip {n} bytes at {}", self.position);
            self.source.skip(n)?;
            self.position = self.position.saturating_add(n);
        }
        Ok(())
    }

    fn read_payload(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(READ_CHUNK as u64) as usize);
        let mut chunk = [0u8; READ_CHUNK];
        let mut remaining = len;
        while remaining > 0 {
            let want = remaining.min(READ_CHUNK as u64) as usize;
            let n = self.source.read_up_to(&mut chunk[..want])?;
            self.position = self.position.saturating_add(n as u64);
            out.extend_from_slice(&chunk[..n]);
            if n < want {
                break;
            }
            remaining -= n as u64;
        }
        Ok(out)
    }
}

/// Iterator returned by [`AtomReader::events`].
#[derive(Debug)]
pub struct Events<'a, S> {
    reader: &'a mut AtomReader<S>,
}

impl<S: AtomSource> Iterator for Events<'_, S> {
    type Item = Result<AtomEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_atom().transpose()
    }
}
