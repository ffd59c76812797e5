//! Per-request session context
//!
//! A [`SessionContext`] carries everything one request knows about its
//! session: decoded variables, the not-yet-decoded remainder of the
//! persisted record, the invalidation deadline, and the bound client
//! address. Values hydrate lazily on first access and everything still
//! live flushes back through the handler exactly once, at finalize.
//!
//! Three variable classes exist. Static variables persist until deleted.
//! Flash variables persist for one additional request unless re-set,
//! extended, or deleted. Constants never leave the process.

use crate::error::SessionResult;
use crate::handlers::SessionHandler;
use crate::record::{self, Deadline, Record};
use chrono::Utc;
use grappelli_codec::SessionValue;
use grappelli_conf::Settings;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle phase of a session as seen by the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	/// No persisted row existed when the request opened the session
	Fresh,
	/// Bound to a persisted row, not mid-transition
	Active,
	/// Opened under an old id whose grace window has not yet elapsed
	Transitioning,
	/// `destroy` ran; finalize will not write the row back
	Destroyed,
}

#[derive(Debug)]
pub struct SessionContext {
	id: String,
	handler: Arc<dyn SessionHandler>,
	settings: Arc<Settings>,
	/// Persisted entries not yet hydrated, storage key to envelope
	record: Record,
	statics: HashMap<String, SessionValue>,
	flashes: HashMap<String, SessionValue>,
	/// Flash names that survive this request's cleanup
	extended: HashSet<String>,
	constants: HashMap<String, SessionValue>,
	deadline: Deadline,
	client: Option<String>,
	cookie_lifetime: Option<u32>,
	owns_transition: bool,
	was_fresh: bool,
	destroyed: bool,
}

impl SessionContext {
	pub(crate) fn from_record(
		id: String,
		handler: Arc<dyn SessionHandler>,
		settings: Arc<Settings>,
		mut record: Record,
		was_fresh: bool,
	) -> Self {
		let deadline = match record.remove(record::DEADLINE_KEY) {
			Some(envelope) => match record::parse_deadline(&envelope) {
				Some(raw) => Deadline::from_raw(raw),
				None => {
					tracing::warn!(session = %id, "unreadable deadline entry; treating as unset");
					Deadline::Unset
				}
			},
			None => Deadline::Unset,
		};
		let client = record.remove(record::CLIENT_KEY).and_then(|envelope| {
			let parsed = record::parse_client(&envelope);
			if parsed.is_none() {
				tracing::warn!(session = %id, "unreadable client binding; treating as unbound");
			}
			parsed
		});

		Self {
			id,
			handler,
			settings,
			record,
			statics: HashMap::new(),
			flashes: HashMap::new(),
			extended: HashSet::new(),
			constants: HashMap::new(),
			deadline,
			client,
			cookie_lifetime: None,
			owns_transition: false,
			was_fresh,
			destroyed: false,
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	/// Client address the session is bound to, once recorded
	pub fn client(&self) -> Option<&str> {
		self.client.as_deref()
	}

	/// Cookie expiry requested via [`set_lifetime`](Self::set_lifetime)
	pub fn cookie_lifetime(&self) -> Option<u32> {
		self.cookie_lifetime
	}

	pub fn state(&self) -> LifecycleState {
		if self.destroyed {
			return LifecycleState::Destroyed;
		}
		let now = Utc::now().timestamp();
		if matches!(self.deadline, Deadline::TransitioningUntil(until) if until > now)
			&& !self.owns_transition
		{
			return LifecycleState::Transitioning;
		}
		if self.was_fresh {
			LifecycleState::Fresh
		} else {
			LifecycleState::Active
		}
	}

	// -- static variables --

	/// Fetch a static variable, hydrating it from the persisted record on
	/// first access. `Ok(None)` means the name was never set; a stored
	/// null reads back as `Some` of a null value.
	pub fn get_static(&mut self, name: &str) -> SessionResult<Option<&SessionValue>> {
		if !self.statics.contains_key(name) {
			if let Some(envelope) = self.record.remove(&record::static_key(name)) {
				let value = grappelli_codec::decode(&envelope)?;
				self.statics.insert(name.to_string(), value);
			}
		}
		Ok(self.statics.get(name))
	}

	/// Whether a static variable exists, persisted or in memory, without
	/// decoding it
	pub fn has_static(&self, name: &str) -> bool {
		self.statics.contains_key(name) || self.record.contains_key(&record::static_key(name))
	}

	pub fn set_static(&mut self, name: &str, value: impl Into<SessionValue>) {
		self.record.remove(&record::static_key(name));
		self.statics.insert(name.to_string(), value.into());
	}

	/// Set a static variable only when the name is not already set;
	/// returns whether the value landed
	pub fn set_static_if_absent(&mut self, name: &str, value: impl Into<SessionValue>) -> bool {
		if self.has_static(name) {
			return false;
		}
		self.set_static(name, value);
		true
	}

	/// Remove a static variable; returns whether anything was removed
	pub fn delete_static(&mut self, name: &str) -> bool {
		let persisted = self.record.remove(&record::static_key(name)).is_some();
		self.statics.remove(name).is_some() || persisted
	}

	// -- flash variables --

	/// Fetch a flash variable, hydrating it like
	/// [`get_static`](Self::get_static). Reading does not extend the
	/// flash lifetime.
	pub fn get_flash(&mut self, name: &str) -> SessionResult<Option<&SessionValue>> {
		if !self.flashes.contains_key(name) {
			if let Some(envelope) = self.record.remove(&record::flash_key(name)) {
				let value = grappelli_codec::decode(&envelope)?;
				self.flashes.insert(name.to_string(), value);
			}
		}
		Ok(self.flashes.get(name))
	}

	pub fn has_flash(&self, name: &str) -> bool {
		self.flashes.contains_key(name) || self.record.contains_key(&record::flash_key(name))
	}

	/// Set a flash variable. Setting marks the name extended, so the
	/// value survives this request's cleanup and stays visible for one
	/// additional request.
	pub fn set_flash(&mut self, name: &str, value: impl Into<SessionValue>) {
		self.record.remove(&record::flash_key(name));
		self.flashes.insert(name.to_string(), value.into());
		self.extended.insert(name.to_string());
	}

	/// Set a flash variable only when the name is not already set;
	/// returns whether the value landed
	pub fn set_flash_if_absent(&mut self, name: &str, value: impl Into<SessionValue>) -> bool {
		if self.has_flash(name) {
			return false;
		}
		self.set_flash(name, value);
		true
	}

	/// Remove a flash variable and its extension mark; returns whether
	/// anything was removed
	pub fn delete_flash(&mut self, name: &str) -> bool {
		let persisted = self.record.remove(&record::flash_key(name)).is_some();
		let cached = self.flashes.remove(name).is_some();
		self.extended.remove(name);
		cached || persisted
	}

	/// Renew the flash lifetime of one known name for the current
	/// request; returns `false` for names not currently set
	pub fn extend_flash(&mut self, name: &str) -> bool {
		if !self.has_flash(name) {
			return false;
		}
		self.extended.insert(name.to_string());
		true
	}

	/// Renew the flash lifetime of every currently-known name
	pub fn extend_all_flash(&mut self) {
		let mut names: Vec<String> = self.flashes.keys().cloned().collect();
		names.extend(
			self.record
				.keys()
				.filter(|key| record::is_flash_key(key))
				.map(|key| record::key_name(key).to_string()),
		);
		self.extended.extend(names);
	}

	// -- constants --

	/// Fetch a process-local constant; constants are never persisted
	pub fn get_constant(&self, name: &str) -> Option<&SessionValue> {
		self.constants.get(name)
	}

	pub fn has_constant(&self, name: &str) -> bool {
		self.constants.contains_key(name)
	}

	pub fn set_constant(&mut self, name: &str, value: impl Into<SessionValue>) {
		self.constants.insert(name.to_string(), value.into());
	}

	pub fn delete_constant(&mut self, name: &str) -> bool {
		self.constants.remove(name).is_some()
	}

	// -- bulk operations --

	/// Remove every static variable, persisted and in memory. With
	/// `include_flash`, flash variables and their extension marks go too.
	/// The deadline and client binding stay untouched.
	pub fn clear(&mut self, include_flash: bool) {
		self.record.retain(|key, _| {
			if record::is_static_key(key) {
				return false;
			}
			!(include_flash && record::is_flash_key(key))
		});
		self.statics.clear();
		if include_flash {
			self.flashes.clear();
			self.extended.clear();
		}
	}

	/// Drop every flash entry whose name was not extended this request
	pub(crate) fn cleanup_flash(&mut self) {
		let extended = &self.extended;
		self.record
			.retain(|key, _| !record::is_flash_key(key) || extended.contains(record::key_name(key)));
		let extended = &self.extended;
		self.flashes.retain(|name, _| extended.contains(name));
	}

	// -- lifecycle --

	/// Whether another request's transition window is still open.
	///
	/// Renewal, replacement, and lifetime changes all refuse to run while
	/// a grace window this context did not start is pending; racing them
	/// would supersede an in-flight renewal.
	fn transition_superseded(&self, now: i64) -> bool {
		!self.owns_transition
			&& matches!(self.deadline, Deadline::TransitioningUntil(until) if until > now)
	}

	fn fresh_deadline(&self, now: i64) -> Deadline {
		let lifetime = i64::from(self.settings.session.lifetime_secs);
		if lifetime > 0 {
			Deadline::ExpiresAt(now + lifetime)
		} else {
			Deadline::Unset
		}
	}

	/// Regenerate the session id, keeping all data.
	///
	/// With a nonzero transition grace period the old row stays readable
	/// until the window elapses, so requests already in flight under the
	/// old id keep working. Returns `Ok(false)` without renewing when a
	/// foreign grace window is still open.
	pub async fn renew_id(&mut self) -> SessionResult<bool> {
		let now = Utc::now().timestamp();
		if self.transition_superseded(now) {
			return Ok(false);
		}

		let grace = i64::from(self.settings.session.transition_secs);
		if grace == 0 {
			self.handler.destroy(&self.id).await?;
		} else {
			// Persist the old row under its grace-window deadline before
			// the id changes
			self.deadline = Deadline::TransitioningUntil(now + grace);
			let payload = self.compose_record()?;
			self.handler.write(&self.id, &payload).await?;
		}

		let old_id = std::mem::replace(&mut self.id, Uuid::new_v4().to_string());
		self.deadline = self.fresh_deadline(now);
		self.owns_transition = true;
		tracing::debug!(old = %old_id, new = %self.id, "session id renewed");
		Ok(true)
	}

	/// Move the session to a caller-chosen id, keeping all data.
	///
	/// The old row is destroyed and the data is written under the new id
	/// immediately. Fails like [`renew_id`](Self::renew_id) while a
	/// foreign grace window is open.
	pub async fn replace_id(&mut self, new_id: impl Into<String>) -> SessionResult<bool> {
		let now = Utc::now().timestamp();
		if self.transition_superseded(now) {
			return Ok(false);
		}

		let old_id = std::mem::replace(&mut self.id, new_id.into());
		self.handler.destroy(&old_id).await?;
		self.deadline = self.fresh_deadline(now);
		self.owns_transition = true;

		let payload = self.compose_record()?;
		self.handler.write(&self.id, &payload).await?;
		tracing::debug!(old = %old_id, new = %self.id, "session id replaced");
		Ok(true)
	}

	/// Set the session cookie's expiry in seconds, `0` meaning "end of
	/// client session". Does not alter the invalidation deadline. Fails
	/// like [`renew_id`](Self::renew_id) while a foreign grace window is
	/// open.
	pub fn set_lifetime(&mut self, seconds: u32) -> bool {
		if self.transition_superseded(Utc::now().timestamp()) {
			return false;
		}
		self.cookie_lifetime = Some(seconds);
		true
	}

	/// Destroy the persisted row; finalize will only close the handler
	pub async fn destroy(&mut self) -> SessionResult<bool> {
		let existed = self.handler.destroy(&self.id).await?;
		self.destroyed = true;
		tracing::debug!(session = %self.id, "session destroyed");
		Ok(existed)
	}

	/// Per-request entry checks, applied once right after the record is
	/// loaded and before any variable access.
	pub(crate) async fn apply_entry_checks(&mut self, client_addr: &str) -> SessionResult<()> {
		let now = Utc::now().timestamp();

		match self.deadline {
			Deadline::Unset => {
				self.deadline = self.fresh_deadline(now);
			}
			Deadline::TransitioningUntil(until) if until <= now => {
				// Grace window over: the old row dies and the request
				// continues under a brand-new session
				self.handler.destroy(&self.id).await?;
				let old_id = std::mem::replace(&mut self.id, Uuid::new_v4().to_string());
				self.record.clear();
				self.statics.clear();
				self.flashes.clear();
				self.extended.clear();
				self.constants.clear();
				self.client = None;
				self.was_fresh = true;
				self.deadline = self.fresh_deadline(now);
				tracing::debug!(old = %old_id, new = %self.id, "transition window elapsed; session recreated");
			}
			Deadline::ExpiresAt(at) if at <= now => {
				self.renew_id().await?;
			}
			_ => {}
		}

		// Binding checks leave flash variables alone
		if let Some(bound) = &self.client {
			if bound != client_addr {
				tracing::warn!(
					session = %self.id,
					bound = %bound,
					current = %client_addr,
					"client address changed; clearing static session data"
				);
				self.clear(false);
				self.client = Some(client_addr.to_string());
			}
		} else {
			self.client = Some(client_addr.to_string());
		}

		Ok(())
	}

	/// Flush the session and release the handler.
	///
	/// `ran_unit` reports whether a request-handling unit actually ran;
	/// flash cleanup only happens when one did, so aborted requests do
	/// not consume flash lifetimes. Runs last among shutdown actions.
	pub async fn finalize(mut self, ran_unit: bool) -> SessionResult<()> {
		if self.destroyed {
			return self.handler.close().await;
		}
		if ran_unit {
			self.cleanup_flash();
		}
		let payload = self.compose_record()?;
		self.handler.write(&self.id, &payload).await?;
		self.handler.close().await
	}

	/// Encode every live entry back into record form
	fn compose_record(&self) -> SessionResult<Vec<u8>> {
		let mut record = self.record.clone();
		for (name, value) in &self.statics {
			record.insert(record::static_key(name), grappelli_codec::encode(value)?);
		}
		for (name, value) in &self.flashes {
			record.insert(record::flash_key(name), grappelli_codec::encode(value)?);
		}
		if let Some(raw) = self.deadline.to_raw() {
			record.insert(
				record::DEADLINE_KEY.to_string(),
				record::deadline_envelope(raw),
			);
		}
		if let Some(client) = &self.client {
			record.insert(record::CLIENT_KEY.to_string(), record::client_envelope(client));
		}
		record::serialize_record(&record)
	}
}
