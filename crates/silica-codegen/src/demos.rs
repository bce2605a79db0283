//! Built-in demo circuits.
//!
//! Small netlists exercising the pipeline end to end, shared by the
//! integration tests and the CLI. Each returns the netlist plus the top
//! definition to compile.

use silica_netlist::{ConfigValue, DefnId, Netlist, NetlistError, ResetKind};

/// Names accepted by [`build`].
pub const DEMO_NAMES: &[&str] = &[
    "comb_logic",
    "simple_hierarchy",
    "aggregates_bits",
    "aggregates_array",
    "register",
    "wire_feedback",
];

/// Builds a demo circuit by name.
pub fn build(name: &str) -> Option<Result<(Netlist, DefnId), NetlistError>> {
    match name {
        "comb_logic" => Some(comb_logic()),
        "simple_hierarchy" => Some(simple_hierarchy()),
        "aggregates_bits" => Some(aggregates_bits()),
        "aggregates_array" => Some(aggregates_array()),
        "register" => Some(register()),
        "wire_feedback" => Some(wire_feedback()),
        _ => None,
    }
}

/// A unary `(lib, op)` primitive over `Bits(width)`: ports `I`, `O`.
pub fn unary_primitive(
    nl: &mut Netlist,
    lib: &str,
    op: &str,
    width: u32,
) -> Result<DefnId, NetlistError> {
    let d = nl.new_primitive(&format!("{lib}_{op}{width}"), lib, op);
    let t = nl.types.bits(width);
    nl.add_input(d, "I", t)?;
    nl.add_output(d, "O", t)?;
    Ok(d)
}

/// A binary `(lib, op)` primitive over `Bits(width)`: ports `I0`, `I1`, `O`.
pub fn binary_primitive(
    nl: &mut Netlist,
    lib: &str,
    op: &str,
    width: u32,
) -> Result<DefnId, NetlistError> {
    let d = nl.new_primitive(&format!("{lib}_{op}{width}"), lib, op);
    let t = nl.types.bits(width);
    nl.add_input(d, "I0", t)?;
    nl.add_input(d, "I1", t)?;
    nl.add_output(d, "O", t)?;
    Ok(d)
}

/// `y = z = a | ~a | b` over `Bits(16)`.
fn comb_defn(nl: &mut Netlist) -> Result<DefnId, NetlistError> {
    let t = nl.types.bits(16);
    let top = nl.new_definition("comb");
    let a = nl.add_input(top, "a", t)?;
    let b = nl.add_input(top, "b", t)?;
    let _c = nl.add_input(top, "c", t)?;
    let y = nl.add_output(top, "y", t)?;
    let z = nl.add_output(top, "z", t)?;

    let not_p = unary_primitive(nl, "coreir", "not", 16)?;
    let or_p = binary_primitive(nl, "coreir", "or", 16)?;
    let inv = nl.instantiate(top, not_p, "not_inst")?;
    let or0 = nl.instantiate(top, or_p, "or_inst0")?;
    let or1 = nl.instantiate(top, or_p, "or_inst1")?;

    let inv_i = nl.port(inv, "I")?;
    let inv_o = nl.port(inv, "O")?;
    nl.wire(a, inv_i)?;
    let or0_i0 = nl.port(or0, "I0")?;
    let or0_i1 = nl.port(or0, "I1")?;
    let or0_o = nl.port(or0, "O")?;
    nl.wire(a, or0_i0)?;
    nl.wire(inv_o, or0_i1)?;
    let or1_i0 = nl.port(or1, "I0")?;
    let or1_i1 = nl.port(or1, "I1")?;
    let or1_o = nl.port(or1, "O")?;
    nl.wire(or0_o, or1_i0)?;
    nl.wire(b, or1_i1)?;
    nl.wire(or1_o, y)?;
    nl.wire(or1_o, z)?;
    Ok(top)
}

pub fn comb_logic() -> Result<(Netlist, DefnId), NetlistError> {
    let mut nl = Netlist::new();
    let top = comb_defn(&mut nl)?;
    Ok((nl, top))
}

/// A wrapper instantiating `comb` and forwarding its interface.
pub fn simple_hierarchy() -> Result<(Netlist, DefnId), NetlistError> {
    let mut nl = Netlist::new();
    let inner = comb_defn(&mut nl)?;
    let t = nl.types.bits(16);
    let top = nl.new_definition("simple_hierarchy");
    let a = nl.add_input(top, "a", t)?;
    let b = nl.add_input(top, "b", t)?;
    let c = nl.add_input(top, "c", t)?;
    let y = nl.add_output(top, "y", t)?;
    let z = nl.add_output(top, "z", t)?;
    let u = nl.instantiate(top, inner, "comb_inst")?;
    for (outer, port) in [(a, "a"), (b, "b"), (c, "c")] {
        let p = nl.port(u, port)?;
        nl.wire(outer, p)?;
    }
    let uy = nl.port(u, "y")?;
    let uz = nl.port(u, "z")?;
    nl.wire(uy, y)?;
    nl.wire(uz, z)?;
    Ok((nl, top))
}

/// `y[7:0] = a[15:8]; y[15:8] = a[7:0]` over `Bits(16)`.
pub fn aggregates_bits() -> Result<(Netlist, DefnId), NetlistError> {
    let mut nl = Netlist::new();
    let t = nl.types.bits(16);
    let top = nl.new_definition("simple_aggregates_bits");
    let a = nl.add_input(top, "a", t)?;
    let y = nl.add_output(top, "y", t)?;
    let a_lo = nl.slice(a, 0, 8)?;
    let a_hi = nl.slice(a, 8, 16)?;
    let y_lo = nl.slice(y, 0, 8)?;
    let y_hi = nl.slice(y, 8, 16)?;
    nl.wire(a_hi, y_lo)?;
    nl.wire(a_lo, y_hi)?;
    Ok((nl, top))
}

/// Half-swap over `Array[8, Bits(16)]`, wired element by element.
pub fn aggregates_array() -> Result<(Netlist, DefnId), NetlistError> {
    let mut nl = Netlist::new();
    let b16 = nl.types.bits(16);
    let t = nl.types.array(8, b16);
    let top = nl.new_definition("simple_aggregates_array");
    let a = nl.add_input(top, "a", t)?;
    let y = nl.add_output(top, "y", t)?;
    for i in 0..8 {
        let src = nl.elem(a, (i + 4) % 8)?;
        let dst = nl.elem(y, i)?;
        nl.wire(src, dst)?;
    }
    Ok((nl, top))
}

/// An 8-bit register with clock enable and active-low async reset.
pub fn register() -> Result<(Netlist, DefnId), NetlistError> {
    let mut nl = Netlist::new();
    let t = nl.types.bits(8);
    let bit = nl.types.bit();
    let clk_t = nl.types.clock();
    let rst_t = nl.types.reset(ResetKind::AsyncN);

    let reg_p = nl.new_primitive("Register", "magma", "register");
    nl.add_input(reg_p, "I", t)?;
    nl.add_input(reg_p, "CE", bit)?;
    nl.add_input(reg_p, "CLK", clk_t)?;
    nl.add_input(reg_p, "RESET", rst_t)?;
    nl.add_output(reg_p, "O", t)?;
    nl.set_config(reg_p, "init", ConfigValue::Int(0))?;

    let top = nl.new_definition("register_demo");
    let i = nl.add_input(top, "I", t)?;
    let ce = nl.add_input(top, "CE", bit)?;
    let clk = nl.add_input(top, "CLK", clk_t)?;
    let rst = nl.add_input(top, "RESETN", rst_t)?;
    let o = nl.add_output(top, "O", t)?;

    let r = nl.instantiate(top, reg_p, "reg_inst")?;
    for (outer, port) in [(i, "I"), (ce, "CE"), (clk, "CLK"), (rst, "RESET")] {
        let p = nl.port(r, port)?;
        nl.wire(outer, p)?;
    }
    let ro = nl.port(r, "O")?;
    nl.wire(ro, o)?;
    Ok((nl, top))
}

/// A `coreir.wire` fed by its own consumer: `w = a | w`.
pub fn wire_feedback() -> Result<(Netlist, DefnId), NetlistError> {
    let mut nl = Netlist::new();
    let t = nl.types.bits(8);
    let top = nl.new_definition("wire_feedback");
    let a = nl.add_input(top, "a", t)?;
    let y = nl.add_output(top, "y", t)?;

    let wire_p = unary_primitive(&mut nl, "coreir", "wire", 8)?;
    let or_p = binary_primitive(&mut nl, "coreir", "or", 8)?;
    let w = nl.instantiate(top, wire_p, "W")?;
    let c = nl.instantiate(top, or_p, "C")?;

    let w_i = nl.port(w, "I")?;
    let w_o = nl.port(w, "O")?;
    let c_i0 = nl.port(c, "I0")?;
    let c_i1 = nl.port(c, "I1")?;
    let c_o = nl.port(c, "O")?;
    nl.wire(w_o, c_i0)?;
    nl.wire(a, c_i1)?;
    nl.wire(c_o, w_i)?;
    nl.wire(w_o, y)?;
    Ok((nl, top))
}
