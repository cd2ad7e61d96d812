//! Serialisation of DNS messages to the wire format.  See the `types`
//! module for details of the format.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

use crate::protocol::types::*;

impl Message {
    /// # Errors
    ///
    /// If the message is invalid (the `Message` type permits more
    /// states than strictly allowed).
    pub fn to_octets(&self) -> Result<BytesMut, Error> {
        let mut buffer = WritableBuffer::default();
        self.serialise(&mut buffer)?;
        Ok(buffer.octets)
    }

    /// # Errors
    ///
    /// If the message is invalid (the `Message` type permits more
    /// states than strictly allowed).
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        let qdcount = usize_to_u16(self.questions.len())?;
        let ancount = usize_to_u16(self.answers.len())?;
        let nscount = usize_to_u16(self.authority.len())?;
        let arcount = usize_to_u16(self.additional.len())?;

        self.header.serialise(buffer);
        buffer.write_u16(qdcount);
        buffer.write_u16(ancount);
        buffer.write_u16(nscount);
        buffer.write_u16(arcount);

        for question in &self.questions {
            question.serialise(buffer);
        }
        for rr in &self.answers {
            rr.serialise(buffer)?;
        }
        for rr in &self.authority {
            rr.serialise(buffer)?;
        }
        for rr in &self.additional {
            rr.serialise(buffer)?;
        }

        Ok(())
    }
}

impl Header {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        // octet 1
        let flag_qr = if self.is_response { HEADER_MASK_QR } else { 0 };
        let field_opcode = HEADER_MASK_OPCODE & (u8::from(self.opcode) << HEADER_OFFSET_OPCODE);
        let flag_aa = if self.is_authoritative {
            HEADER_MASK_AA
        } else {
            0
        };
        let flag_tc = if self.is_truncated { HEADER_MASK_TC } else { 0 };
        let flag_rd = if self.recursion_desired {
            HEADER_MASK_RD
        } else {
            0
        };
        // octet 2
        let flag_ra = if self.recursion_available {
            HEADER_MASK_RA
        } else {
            0
        };
        let flag_z = if self.reserved { HEADER_MASK_Z } else { 0 };
        let flag_ad = if self.authentic_data {
            HEADER_MASK_AD
        } else {
            0
        };
        let flag_cd = if self.checking_disabled {
            HEADER_MASK_CD
        } else {
            0
        };
        let field_rcode = HEADER_MASK_RCODE & (u8::from(self.rcode) << HEADER_OFFSET_RCODE);

        buffer.write_u16(self.id);
        buffer.write_u8(flag_qr | field_opcode | flag_aa | flag_tc | flag_rd);
        buffer.write_u8(flag_ra | flag_z | flag_ad | flag_cd | field_rcode);
    }
}

impl Question {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        self.name.serialise(buffer);
        self.qtype.serialise(buffer);
        self.qclass.serialise(buffer);
    }
}

impl ResourceRecord {
    /// # Errors
    ///
    /// If the RDATA is too long.
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        let rdlength = usize_to_u16(self.rdata.len())?;

        self.name.serialise(buffer);
        self.rtype.serialise(buffer);
        self.rclass.serialise(buffer);
        buffer.write_u32(self.ttl);
        buffer.write_u16(rdlength);
        buffer.write_octets(&self.rdata);

        Ok(())
    }
}

impl DomainName {
    /// Write the name, or a pointer to an earlier copy of it in the
    /// same message.
    ///
    /// Only whole names are compressed: a name which shares a suffix
    /// with an earlier name, but is not identical to it, is written
    /// out in full.
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        if let Some(ptr) = buffer.name_pointer(self) {
            buffer.write_u16(ptr);
            return;
        }

        buffer.memoise_name(self);
        for label in self.labels() {
            buffer.write_u8(label.len());
            buffer.write_octets(label.octets());
        }
        buffer.write_u8(0);
    }
}

impl QueryType {
    pub fn serialise(self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.into());
    }
}

impl QueryClass {
    pub fn serialise(self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.into());
    }
}

impl RecordType {
    pub fn serialise(self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.into());
    }
}

impl RecordClass {
    pub fn serialise(self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.into());
    }
}

/// Errors encountered when serialising a message.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// A counter does not fit in the desired width.
    CounterTooLarge { counter: usize, bits: u32 },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CounterTooLarge { counter, bits } => {
                write!(f, "'{counter}' cannot be converted to a u{bits}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A buffer which can be written to, for serialisation purposes.
///
/// The buffer remembers where each name was first written, so later
/// occurrences of the same name anywhere in the message become
/// compression pointers.
pub struct WritableBuffer {
    pub octets: BytesMut,
    name_pointers: HashMap<DomainName, u16>,
}

impl Default for WritableBuffer {
    fn default() -> Self {
        Self {
            octets: BytesMut::with_capacity(512),
            name_pointers: HashMap::new(),
        }
    }
}

impl WritableBuffer {
    pub fn index(&self) -> usize {
        self.octets.len()
    }

    /// Record that `name` starts at the current index.  Nothing is
    /// recorded for the root name (a pointer would be longer than the
    /// name), or if the index does not fit in a pointer's 14 bits.
    pub fn memoise_name(&mut self, name: &DomainName) {
        let index = self.index();
        if name.is_root() || index > POINTER_MAX_OFFSET || self.name_pointers.contains_key(name) {
            return;
        }

        if let Ok(index) = u16::try_from(index) {
            let [hi, lo] = index.to_be_bytes();
            self.name_pointers
                .insert(name.clone(), u16::from_be_bytes([hi | POINTER_TAG, lo]));
        }
    }

    pub fn name_pointer(&self, name: &DomainName) -> Option<u16> {
        self.name_pointers.get(name).copied()
    }

    pub fn write_u8(&mut self, octet: u8) {
        self.octets.put_u8(octet);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.octets.put_u16(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.octets.put_u32(value);
    }

    pub fn write_octets(&mut self, octets: &[u8]) {
        self.octets.put_slice(octets);
    }
}

/// Helper function to convert a `usize` into a `u16` (or return an error).
///
/// # Errors
///
/// If the value cannot be converted.
fn usize_to_u16(counter: usize) -> Result<u16, Error> {
    if let Ok(t) = u16::try_from(counter) {
        Ok(t)
    } else {
        Err(Error::CounterTooLarge {
            counter,
            bits: u16::BITS,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    fn roundtrip_message() {
        for _ in 0..100 {
            let original = arbitrary_message();
            let deserialised = original.to_octets().map(|octets| Message::from_octets(&octets));

            assert_eq!(Ok(Ok(original)), deserialised);
        }
    }

    #[test]
    #[rustfmt::skip]
    fn serialise_domain() {
        let mut buf = WritableBuffer::default();
        domain("example.com.").serialise(&mut buf);

        assert_eq!(
            vec![
                0x07, 0x65, 0x78, 0x61, 0x6D, 0x70, 0x6C, 0x65, // "example"
                0x03, 0x63, 0x6F, 0x6D, // "com"
                0x00,
            ],
            buf.octets,
        );
    }

    #[test]
    fn serialise_root_domain() {
        let mut buf = WritableBuffer::default();
        DomainName::root_domain().serialise(&mut buf);
        DomainName::root_domain().serialise(&mut buf);

        assert_eq!(vec![0, 0], buf.octets);
    }

    #[test]
    #[rustfmt::skip]
    fn serialise_header() {
        let mut buf = WritableBuffer::default();
        Header {
            id: 0x1234,
            is_response: true,
            opcode: Opcode::Standard,
            is_authoritative: false,
            is_truncated: false,
            recursion_desired: true,
            recursion_available: true,
            reserved: false,
            authentic_data: true,
            checking_disabled: true,
            rcode: Rcode::NameError,
        }.serialise(&mut buf);

        assert_eq!(vec![0x12, 0x34, 0b1000_0001, 0b1011_0011], buf.octets);
    }

    #[test]
    #[rustfmt::skip]
    fn test_name_compression() {
        let mut buf = WritableBuffer::default();
        buf.write_u8(1);
        buf.write_u8(2);
        buf.write_u8(3);
        buf.write_u8(4);
        domain("www.example.com.").serialise(&mut buf);
        domain("www.example.com.").serialise(&mut buf);

        assert_eq!(
            vec![
                1, 2, 3, 4,
                // domain 1
                3, 119, 119, 119, // "www"
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 99, 111, 109, 0, // "com"
                // domain 2
                0b1100_0000, 0b0000_0100 // pointer
            ],
            buf.octets,
        );
    }

    #[test]
    #[rustfmt::skip]
    fn test_name_compression_whole_names_only() {
        let mut buf = WritableBuffer::default();
        domain("www.example.com.").serialise(&mut buf);
        domain("example.com.").serialise(&mut buf);

        assert_eq!(
            vec![
                // domain 1
                3, 119, 119, 119, // "www"
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 99, 111, 109, 0, // "com"
                // domain 2
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 99, 111, 109, 0, // "com"
            ],
            buf.octets,
        );
    }

    #[test]
    fn test_name_compression_case_sensitive() {
        let mut buf = WritableBuffer::default();
        domain("example.com.").serialise(&mut buf);
        domain("EXAMPLE.com.").serialise(&mut buf);

        assert_eq!(26, buf.index());
    }

    #[test]
    fn test_name_compression_offset_limit() {
        let mut buf = WritableBuffer::default();
        buf.write_octets(&[0; POINTER_MAX_OFFSET + 1]);
        domain("example.com.").serialise(&mut buf);
        domain("example.com.").serialise(&mut buf);

        assert_eq!(None, buf.name_pointer(&domain("example.com.")));
        assert_eq!(POINTER_MAX_OFFSET + 1 + 13 + 13, buf.index());
    }

    #[test]
    fn test_name_compression_last_offset() {
        let mut buf = WritableBuffer::default();
        buf.write_octets(&[0; POINTER_MAX_OFFSET]);
        domain("example.com.").serialise(&mut buf);
        domain("example.com.").serialise(&mut buf);

        assert_eq!(Some(0xFFFF), buf.name_pointer(&domain("example.com.")));
        assert_eq!(&[0xFF, 0xFF], &buf.octets[POINTER_MAX_OFFSET + 13..]);
    }

    #[test]
    #[rustfmt::skip]
    fn test_name_compression_records() {
        let question = question("www.example.com.", RecordType::A);
        let message = Message {
            header: Message::from_question(0x1234, question.clone()).header,
            questions: vec![question.clone(), question],
            answers: vec![a_record("www.example.com.", [1, 2, 3, 4])],
            authority: Vec::new(),
            additional: Vec::new(),
        };

        assert_eq!(
            Ok(BytesMut::from(&[
                // header
                0x12, 0x34, 0b0000_0001, 0, 0, 2, 0, 1, 0, 0, 0, 0,
                // question 1
                3, 119, 119, 119, // "www"
                7, 101, 120, 97, 109, 112, 108, 101, // "example"
                3, 99, 111, 109, 0, // "com"
                0, 1, 0, 1, // A IN
                // question 2
                0b1100_0000, 12, // pointer
                0, 1, 0, 1, // A IN
                // answer
                0b1100_0000, 12, // pointer
                0, 1, 0, 1, // A IN
                0, 0, 1, 44, // 300
                0, 4, // RDLENGTH
                1, 2, 3, 4,
            ][..])),
            message.to_octets(),
        );
        assert_eq!(
            Ok(message.clone()),
            Message::from_octets(&message.to_octets().unwrap())
        );
    }

    #[test]
    fn test_rdata_is_opaque() {
        let mut buf = WritableBuffer::default();
        domain("mx.example.com.").serialise(&mut buf);

        // MX RDATA naming an earlier name is written as given
        let mut rdata = vec![0, 10];
        rdata.extend_from_slice(&buf.octets);
        let rr = ResourceRecord {
            name: domain("example.com."),
            rtype: RecordType::MX,
            rclass: RecordClass::IN,
            ttl: 300,
            rdata: Bytes::from(rdata.clone()),
        };
        let start = buf.index();
        rr.serialise(&mut buf).unwrap();

        assert_eq!(&rdata[..], &buf.octets[buf.index() - rdata.len()..]);
        assert_eq!(
            start + 13 + 10 + rdata.len(),
            buf.index()
        );
    }
}
