//! Descriptor-driven (de)serialisation of IDL structs.
//!
//! Every IDL struct carries a static *element table*: one
//! [`StructElement`] per field, sorted ascending by field id, recording the
//! field's wire type, requiredness, isset accessors and a pair of plain
//! function pointers that read or write the field through the generic
//! [`ThriftBuffer`] primitives. The generic struct engine
//! ([`read_struct`] / [`write_struct`]) walks the table in a single pass,
//! so serialising a field is one indirect call with no allocation and no
//! virtual dispatch.
//!
//! Tables are `static` data installed by generated code; there is no
//! runtime registration step.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::{Error, FieldRequiredness, ThriftBuffer, WireType};

/// A value encodable in the Thrift binary protocol.
///
/// Implementations exist for every primitive wire type, for the standard
/// container families, and (via generated code delegating to
/// [`read_struct`] / [`write_struct`]) for each IDL struct. `read` and
/// `write` are ordinary functions; the element tables reference them as
/// plain function pointers.
///
/// Both operations return the number of wire bytes consumed or produced.
pub trait ThriftType: Default {
    /// The wire type tag written in field and container headers.
    const WIRE_TYPE: WireType;

    /// Reads a value of this type from `buf` into `out`.
    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error>;

    /// Writes this value into `buf`.
    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error>;
}

impl ThriftType for bool {
    const WIRE_TYPE: WireType = WireType::Bool;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        // Any non-zero wire byte is true.
        *out = buf.read_i8()? != 0;
        Ok(1)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        buf.write_i8(i8::from(*self))
    }
}

impl ThriftType for i8 {
    const WIRE_TYPE: WireType = WireType::I8;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        *out = buf.read_i8()?;
        Ok(1)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        buf.write_i8(*self)
    }
}

impl ThriftType for i16 {
    const WIRE_TYPE: WireType = WireType::I16;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        *out = buf.read_i16()?;
        Ok(2)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        buf.write_i16(*self)
    }
}

impl ThriftType for i32 {
    const WIRE_TYPE: WireType = WireType::I32;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        *out = buf.read_i32()?;
        Ok(4)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        buf.write_i32(*self)
    }
}

impl ThriftType for i64 {
    const WIRE_TYPE: WireType = WireType::I64;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        *out = buf.read_i64()?;
        Ok(8)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        buf.write_i64(*self)
    }
}

impl ThriftType for u64 {
    const WIRE_TYPE: WireType = WireType::U64;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        *out = buf.read_u64()?;
        Ok(8)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        buf.write_u64(*self)
    }
}

impl ThriftType for f64 {
    const WIRE_TYPE: WireType = WireType::Double;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        *out = buf.read_f64()?;
        Ok(8)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        buf.write_f64(*self)
    }
}

impl ThriftType for String {
    const WIRE_TYPE: WireType = WireType::String;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        *out = buf.read_string()?;
        Ok(4 + out.len())
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        buf.write_string(self)
    }
}

/// Reads a container header, returning `(count, bytes consumed)`.
///
/// The element type bytes are discarded: the receiver already knows the
/// expected type from its own descriptor.
fn read_container_begin(buf: &mut ThriftBuffer<'_>, type_bytes: usize) -> Result<(i32, usize), Error> {
    for _ in 0..type_bytes {
        buf.read_i8()?;
    }
    let count = buf.read_i32()?;
    if count < 0 {
        return Err(Error::InvalidLength(count));
    }
    Ok((count, type_bytes + 4))
}

impl<T: ThriftType> ThriftType for Vec<T> {
    const WIRE_TYPE: WireType = WireType::List;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        let (count, mut rsize) = read_container_begin(buf, 1)?;
        out.clear();
        for _ in 0..count {
            let mut v = T::default();
            rsize += T::read(buf, &mut v)?;
            out.push(v);
        }
        Ok(rsize)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        let mut wsize = buf.write_i8(T::WIRE_TYPE as i8)?;
        wsize += buf.write_i32(self.len() as i32)?;
        for v in self {
            wsize += v.write(buf)?;
        }
        Ok(wsize)
    }
}

impl<T: ThriftType + Ord> ThriftType for BTreeSet<T> {
    const WIRE_TYPE: WireType = WireType::Set;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        let (count, mut rsize) = read_container_begin(buf, 1)?;
        out.clear();
        for _ in 0..count {
            let mut v = T::default();
            rsize += T::read(buf, &mut v)?;
            out.insert(v);
        }
        Ok(rsize)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        let mut wsize = buf.write_i8(T::WIRE_TYPE as i8)?;
        wsize += buf.write_i32(self.len() as i32)?;
        for v in self {
            wsize += v.write(buf)?;
        }
        Ok(wsize)
    }
}

impl<T: ThriftType + Eq + Hash> ThriftType for HashSet<T> {
    const WIRE_TYPE: WireType = WireType::Set;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        let (count, mut rsize) = read_container_begin(buf, 1)?;
        out.clear();
        for _ in 0..count {
            let mut v = T::default();
            rsize += T::read(buf, &mut v)?;
            out.insert(v);
        }
        Ok(rsize)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        let mut wsize = buf.write_i8(T::WIRE_TYPE as i8)?;
        wsize += buf.write_i32(self.len() as i32)?;
        for v in self {
            wsize += v.write(buf)?;
        }
        Ok(wsize)
    }
}

impl<K: ThriftType + Ord, V: ThriftType> ThriftType for BTreeMap<K, V> {
    const WIRE_TYPE: WireType = WireType::Map;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        let (count, mut rsize) = read_container_begin(buf, 2)?;
        out.clear();
        for _ in 0..count {
            let mut k = K::default();
            let mut v = V::default();
            rsize += K::read(buf, &mut k)?;
            rsize += V::read(buf, &mut v)?;
            out.insert(k, v);
        }
        Ok(rsize)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        let mut wsize = buf.write_i8(K::WIRE_TYPE as i8)?;
        wsize += buf.write_i8(V::WIRE_TYPE as i8)?;
        wsize += buf.write_i32(self.len() as i32)?;
        for (k, v) in self {
            wsize += k.write(buf)?;
            wsize += v.write(buf)?;
        }
        Ok(wsize)
    }
}

impl<K: ThriftType + Eq + Hash, V: ThriftType> ThriftType for HashMap<K, V> {
    const WIRE_TYPE: WireType = WireType::Map;

    fn read(buf: &mut ThriftBuffer<'_>, out: &mut Self) -> Result<usize, Error> {
        let (count, mut rsize) = read_container_begin(buf, 2)?;
        out.clear();
        for _ in 0..count {
            let mut k = K::default();
            let mut v = V::default();
            rsize += K::read(buf, &mut k)?;
            rsize += V::read(buf, &mut v)?;
            out.insert(k, v);
        }
        Ok(rsize)
    }

    fn write(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        let mut wsize = buf.write_i8(K::WIRE_TYPE as i8)?;
        wsize += buf.write_i8(V::WIRE_TYPE as i8)?;
        wsize += buf.write_i32(self.len() as i32)?;
        for (k, v) in self {
            wsize += k.write(buf)?;
            wsize += v.write(buf)?;
        }
        Ok(wsize)
    }
}

/// One field of an IDL struct as recorded in its element table.
///
/// `read` and `write` are the field's type descriptor pre-composed with
/// the field projection: `read` decodes one value of the field's type
/// directly into the field, `write` encodes the field's current value.
/// `isset`/`set_isset` access the struct's presence block.
pub struct StructElement<T> {
    /// The field's wire type tag.
    pub wire_type: WireType,

    /// The field name from the IDL, for diagnostics only.
    pub name: &'static str,

    /// The field id. Tables are sorted ascending by this value.
    pub field_id: i16,

    /// The isset-bit policy for this field.
    pub required: FieldRequiredness,

    /// Reads the field's presence bit.
    pub isset: fn(&T) -> bool,

    /// Sets the field's presence bit.
    pub set_isset: fn(&mut T),

    /// Decodes one value of the field's type into the field.
    pub read: fn(&mut ThriftBuffer<'_>, &mut T) -> Result<usize, Error>,

    /// Encodes the field's current value.
    pub write: fn(&T, &mut ThriftBuffer<'_>) -> Result<usize, Error>,
}

impl<T> std::fmt::Debug for StructElement<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructElement")
            .field("wire_type", &self.wire_type)
            .field("name", &self.name)
            .field("field_id", &self.field_id)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Implemented by generated code for each IDL struct.
pub trait ThriftStruct: Default {
    /// The struct's element table, sorted ascending by field id.
    fn elements() -> &'static [StructElement<Self>]
    where
        Self: Sized;
}

/// Decodes a struct's field list from `buf` into `msg`, returning the
/// bytes consumed (including the terminating stop byte).
///
/// The element cursor is monotone: fields are matched in ascending id
/// order, mirroring the order every conforming writer emits. A field the
/// table does not list (or lists with a different wire type) is skipped.
pub fn read_struct<T: ThriftStruct + 'static>(
    buf: &mut ThriftBuffer<'_>,
    msg: &mut T,
) -> Result<usize, Error> {
    let elements = T::elements();
    let mut cursor = 0;
    let mut rsize = 0;

    loop {
        let (field_type, field_id) = buf.read_field_begin()?;
        if field_type == WireType::Stop as i8 {
            return Ok(rsize + 1);
        }
        rsize += 3;

        // A struct-typed field with an id the table does not list is
        // stepped into rather than skipped: message envelopes wrap the
        // user struct in a struct field with id 0, and descending lets
        // this loop consume the wrapped fields directly.
        if field_type == WireType::Struct as i8
            && !elements[cursor..].iter().any(|e| e.field_id == field_id)
        {
            continue;
        }

        while cursor < elements.len() && elements[cursor].field_id < field_id {
            cursor += 1;
        }

        match elements.get(cursor) {
            Some(element)
                if element.field_id == field_id && element.wire_type as i8 == field_type =>
            {
                if element.required != FieldRequiredness::Required {
                    (element.set_isset)(msg);
                }
                rsize += (element.read)(buf, msg)?;
            }
            _ => rsize += buf.skip(field_type)?,
        }
    }
}

/// Encodes `msg`'s fields into `buf` in element-table order, returning the
/// bytes produced (including the terminating stop byte).
///
/// Optional fields are emitted only when their isset bit is set; required
/// and default fields are always emitted.
pub fn write_struct<T: ThriftStruct + 'static>(
    msg: &T,
    buf: &mut ThriftBuffer<'_>,
) -> Result<usize, Error> {
    let mut wsize = 0;
    for element in T::elements() {
        if element.required == FieldRequiredness::Optional && !(element.isset)(msg) {
            continue;
        }
        wsize += buf.write_field_begin(element.wire_type as i8, element.field_id)?;
        wsize += (element.write)(msg, buf)?;
    }
    wsize += buf.write_field_stop()?;
    Ok(wsize)
}

/// An object-safe view of any IDL message.
///
/// This is the seam between the codec machinery and the descriptor system:
/// the serialisation adapter moves messages through `dyn IdlMessage`
/// without knowing their concrete type. Every [`ThriftStruct`] implements
/// it automatically.
pub trait IdlMessage {
    /// The message's wire type tag.
    fn wire_type(&self) -> WireType;

    /// Decodes the message from `buf`.
    fn read_from(&mut self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error>;

    /// Encodes the message into `buf`.
    fn write_to(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error>;
}

impl<T: ThriftStruct + 'static> IdlMessage for T {
    fn wire_type(&self) -> WireType {
        WireType::Struct
    }

    fn read_from(&mut self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        read_struct(buf, self)
    }

    fn write_to(&self, buf: &mut ThriftBuffer<'_>) -> Result<usize, Error> {
        write_struct(self, buf)
    }
}
