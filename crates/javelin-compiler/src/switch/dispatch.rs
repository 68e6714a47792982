//! Switch dispatch lowering.
//!
//! Offsets inside `tableswitch`/`lookupswitch` tables are u32 distances
//! relative to the switch opcode. Emitters here write placeholder slots and
//! return their positions; the statement compiler patches each slot once
//! the arm bodies are placed.

use javelin_core::hash::TypeHash;

use crate::codegen::{CodeEmitter, OpCode, ValueKind};

/// Placeholder written into unpatched table slots.
const UNPATCHED: u32 = 0xFFFF_FFFF;

/// Patch positions of one emitted switch instruction.
#[derive(Debug, Clone)]
pub struct SwitchSites {
    /// Offset of the switch opcode; table entries are relative to it.
    pub addr: usize,
    /// Position of the 4-byte default offset slot.
    pub default_site: usize,
    /// Key and position of each 4-byte case offset slot.
    pub case_sites: Vec<(i32, usize)>,
}

impl SwitchSites {
    /// Patch one slot to land at the current position.
    pub fn patch_to_here(&self, emitter: &mut CodeEmitter<'_>, site: usize) {
        let distance = (emitter.current_offset() - self.addr) as u32;
        emitter.patch_u32(site, distance);
    }

    /// Patch the default slot to land at the current position.
    pub fn patch_default_to_here(&self, emitter: &mut CodeEmitter<'_>) {
        self.patch_to_here(emitter, self.default_site);
    }

    /// Slot position for a given key.
    pub fn site_for(&self, key: i32) -> Option<usize> {
        self.case_sites
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, site)| *site)
    }

    /// Point every still-unpatched case slot at the default target. The
    /// default slot must already be patched.
    pub fn patch_holes_to_default(&self, emitter: &mut CodeEmitter<'_>) {
        let default = emitter
            .chunk()
            .read_u32(self.default_site)
            .unwrap_or(UNPATCHED);
        let holes: Vec<usize> = self
            .case_sites
            .iter()
            .filter(|(_, site)| emitter.chunk().read_u32(*site) == Some(UNPATCHED))
            .map(|(_, site)| *site)
            .collect();
        for site in holes {
            emitter.patch_u32(site, default);
        }
    }
}

/// Emit a `tableswitch` covering `low..=high`. Pops the int selector.
/// Every slot in the range gets a case site; keys with no label are holes
/// patched to the default afterwards.
pub fn emit_table_switch(emitter: &mut CodeEmitter<'_>, low: i32, high: i32) -> SwitchSites {
    let addr = emitter.current_offset();
    emitter.emit(OpCode::TableSwitch);
    let default_site = emitter.current_offset();
    emitter.write_u32(UNPATCHED);
    emitter.write_u32(low as u32);
    emitter.write_u32(high as u32);
    let mut case_sites = Vec::with_capacity((high as i64 - low as i64 + 1) as usize);
    let mut key = low as i64;
    while key <= high as i64 {
        case_sites.push((key as i32, emitter.current_offset()));
        emitter.write_u32(UNPATCHED);
        key += 1;
    }
    SwitchSites {
        addr,
        default_site,
        case_sites,
    }
}

/// Emit a `lookupswitch` over the given keys. Pops the int selector.
/// Keys are written in sorted order as the instruction requires.
pub fn emit_lookup_switch(emitter: &mut CodeEmitter<'_>, keys: &[i32]) -> SwitchSites {
    let mut sorted: Vec<i32> = keys.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let addr = emitter.current_offset();
    emitter.emit(OpCode::LookupSwitch);
    let default_site = emitter.current_offset();
    emitter.write_u32(UNPATCHED);
    emitter.write_u32(sorted.len() as u32);
    let mut case_sites = Vec::with_capacity(sorted.len());
    for key in sorted {
        emitter.write_u32(key as u32);
        case_sites.push((key, emitter.current_offset()));
        emitter.write_u32(UNPATCHED);
    }
    SwitchSites {
        addr,
        default_site,
        case_sites,
    }
}

/// `String.hashCode` as the JVM computes it, over UTF-16 code units.
pub fn java_string_hash(s: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    hash
}

/// Patch positions of a two-stage string dispatch.
#[derive(Debug, Clone)]
pub struct StringDispatch {
    /// The second-stage `tableswitch`, keyed by string index.
    pub sites: SwitchSites,
}

/// Emit the two-stage string dispatch.
///
/// Stage one switches on `hashCode()` and confirms each colliding
/// candidate with `equals`, reducing the selector to a dense case index
/// (or -1). Stage two is a plain `tableswitch` on that index. The selector
/// must already be stored in `selector_slot`.
pub fn emit_string_dispatch(
    emitter: &mut CodeEmitter<'_>,
    selector_slot: u32,
    hash_method: TypeHash,
    equals_method: TypeHash,
    strings: &[&str],
) -> StringDispatch {
    // Buckets of string indices per hash, in sorted hash order.
    let mut buckets: Vec<(i32, Vec<usize>)> = Vec::new();
    for (index, s) in strings.iter().enumerate() {
        let hash = java_string_hash(s);
        match buckets.iter_mut().find(|(h, _)| *h == hash) {
            Some((_, members)) => members.push(index),
            None => buckets.push((hash, vec![index])),
        }
    }
    buckets.sort_unstable_by_key(|(hash, _)| *hash);

    emitter.emit_load_local(selector_slot, ValueKind::Reference);
    emitter.emit_invoke_virtual(hash_method, 0, 1);
    let hashes: Vec<i32> = buckets.iter().map(|(hash, _)| *hash).collect();
    let stage_one = emit_lookup_switch(emitter, &hashes);

    // Per bucket: equals chain producing the case index.
    let mut index_jumps = Vec::new();
    for (hash, members) in &buckets {
        let site = stage_one
            .site_for(*hash)
            .unwrap_or(stage_one.default_site);
        stage_one.patch_to_here(emitter, site);
        for &index in members {
            emitter.emit_load_local(selector_slot, ValueKind::Reference);
            emitter.emit_string(strings[index]);
            emitter.emit_invoke_virtual(equals_method, 1, 1);
            let next = emitter.emit_jump(OpCode::IfEq);
            emitter.emit_int(index as i32);
            index_jumps.push(emitter.emit_jump(OpCode::Goto));
            emitter.set_depth(0);
            emitter.patch_jump(next);
        }
        // no candidate matched in this bucket
        emitter.emit(OpCode::IConstM1);
        index_jumps.push(emitter.emit_jump(OpCode::Goto));
        emitter.set_depth(0);
    }
    stage_one.patch_default_to_here(emitter);
    emitter.emit(OpCode::IConstM1);

    // Stage two: all index producers join here with one int on the stack.
    for jump in index_jumps {
        emitter.patch_jump(jump);
    }
    emitter.set_depth(1);
    let high = strings.len() as i32 - 1;
    let sites = emit_table_switch(emitter, 0, high.max(-1));
    StringDispatch { sites }
}

/// Patch positions of a pattern dispatch.
#[derive(Debug, Clone)]
pub struct TypeSwitchDispatch {
    /// Re-entry point for guard retries.
    pub restart: usize,
    pub restart_slot: u32,
    pub selector_slot: u32,
    /// The index `tableswitch`, keyed by label position.
    pub sites: SwitchSites,
}

/// Emit pattern dispatch: an `invokedynamic` type-switch taking the
/// selector and a restart index, then a `tableswitch` on the returned
/// label index. The selector must already be stored in `selector_slot`.
///
/// Guarded arms retry by bumping the restart index and jumping back to
/// the re-entry point, so dispatch resumes past the failed label.
pub fn emit_type_switch(
    emitter: &mut CodeEmitter<'_>,
    bootstrap: TypeHash,
    selector_slot: u32,
    restart_slot: u32,
    labels: usize,
) -> TypeSwitchDispatch {
    emitter.emit(OpCode::IConst0);
    emitter.emit_store_local(restart_slot, ValueKind::Int);
    let restart = emitter.current_offset();
    emitter.emit_load_local(selector_slot, ValueKind::Reference);
    emitter.emit_load_local(restart_slot, ValueKind::Int);
    emitter.emit_invoke_dynamic(bootstrap, 2, 1);
    let high = labels as i32 - 1;
    let sites = emit_table_switch(emitter, 0, high.max(-1));
    TypeSwitchDispatch {
        restart,
        restart_slot,
        selector_slot,
        sites,
    }
}

/// Emit the guard-failure path of a pattern arm: resume dispatch at the
/// next label.
pub fn emit_guard_retry(emitter: &mut CodeEmitter<'_>, dispatch: &TypeSwitchDispatch) {
    emitter.emit_iinc(dispatch.restart_slot, 1);
    emitter.emit_back_jump(dispatch.restart);
}

#[cfg(test)]
mod tests {
    use super::*;
    use javelin_core::constant::ConstantPool;

    #[test]
    fn table_switch_layout() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 0);
        emitter.emit_int(1);
        let sites = emit_table_switch(&mut emitter, 3, 5);
        // body for key 4
        let site = sites.site_for(4).unwrap();
        sites.patch_to_here(&mut emitter, site);
        emitter.emit(OpCode::Return);
        sites.patch_default_to_here(&mut emitter);
        sites.patch_holes_to_default(&mut emitter);
        let chunk = emitter.finish();

        chunk.assert_opcodes(&[OpCode::IConst1, OpCode::TableSwitch, OpCode::Return]);
        // switch at 1: default u32 at 2, low at 6, high at 10, slots at 14
        assert_eq!(chunk.read_u32(6), Some(3));
        assert_eq!(chunk.read_u32(10), Some(5));
        // key 4 lands on the return at addr+25
        assert_eq!(chunk.read_u32(site), Some(25));
        // default and holes land after the return
        assert_eq!(chunk.read_u32(2), Some(26));
        assert_eq!(chunk.read_u32(sites.site_for(3).unwrap()), Some(26));
        assert_eq!(chunk.read_u32(sites.site_for(5).unwrap()), Some(26));
    }

    #[test]
    fn lookup_switch_sorts_keys() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 0);
        emitter.emit_int(7);
        let sites = emit_lookup_switch(&mut emitter, &[1000, 1, 50]);
        let keys: Vec<i32> = sites.case_sites.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 50, 1000]);
        let chunk = emitter.finish();
        // bipush is two bytes, so the switch opcode sits at 2
        assert_eq!(sites.addr, 2);
        // pair count at addr+5
        assert_eq!(chunk.read_u32(sites.addr + 5), Some(3));
    }

    #[test]
    fn string_hash_matches_java() {
        assert_eq!(java_string_hash(""), 0);
        assert_eq!(java_string_hash("a"), 97);
        assert_eq!(java_string_hash("Aa"), java_string_hash("BB"));
        assert_eq!(java_string_hash("hello"), 99_162_322);
    }

    #[test]
    fn string_dispatch_emits_hash_then_equals_chain() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 1);
        let hash = TypeHash::from_name("String.hashCode");
        let equals = TypeHash::from_name("String.equals");
        // "Aa" and "BB" collide, forcing a two-candidate bucket
        let dispatch = emit_string_dispatch(&mut emitter, 0, hash, equals, &["Aa", "BB"]);
        assert_eq!(dispatch.sites.case_sites.len(), 2);
        let chunk = emitter.finish();
        chunk.assert_contains_opcodes(&[
            OpCode::ALoad,
            OpCode::InvokeVirtual,
            OpCode::LookupSwitch,
            // first candidate
            OpCode::ALoad,
            OpCode::Ldc,
            OpCode::InvokeVirtual,
            OpCode::IfEq,
            OpCode::IConst0,
            OpCode::Goto,
            // second candidate
            OpCode::ALoad,
            OpCode::Ldc,
            OpCode::InvokeVirtual,
            OpCode::IfEq,
            OpCode::IConst1,
            OpCode::Goto,
            // bucket exhausted, then lookup default
            OpCode::IConstM1,
            OpCode::Goto,
            OpCode::IConstM1,
            OpCode::TableSwitch,
        ]);
    }

    #[test]
    fn type_switch_restart_loop() {
        let mut pool = ConstantPool::new();
        let mut emitter = CodeEmitter::new(&mut pool, 2);
        let bootstrap = TypeHash::from_name("typeSwitch");
        let dispatch = emit_type_switch(&mut emitter, bootstrap, 0, 1, 3);
        assert_eq!(dispatch.sites.case_sites.len(), 3);

        // a failing guard resumes dispatch
        let site = dispatch.sites.site_for(0).unwrap();
        dispatch.sites.patch_to_here(&mut emitter, site);
        emit_guard_retry(&mut emitter, &dispatch);
        let chunk = emitter.finish();
        chunk.assert_contains_opcodes(&[
            OpCode::IConst0,
            OpCode::IStore,
            OpCode::ALoad,
            OpCode::ILoad,
            OpCode::InvokeDynamic,
            OpCode::TableSwitch,
            OpCode::IInc,
            OpCode::GotoBack,
        ]);
    }
}
