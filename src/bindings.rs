// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Binding state and the strategies that apply it.

* [`state_cache`] remembers what is bound and decides when a rebind is needed.
* [`binding_mode`] turns bind decisions into target commands, by device address or by table slot.
* [`slot`] names the slots and uniforms involved.
*/

pub mod binding_mode;
pub mod slot;
pub mod state_cache;

pub use binding_mode::{Binder, BindingMode, BindingStrategy, DirectAddressing, IndexedTable};
pub use slot::{Slot, UniformLocation};
pub use state_cache::{BindingState, Category};
