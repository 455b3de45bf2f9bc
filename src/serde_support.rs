use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::float::Float;
use crate::opcode::OpCode;
use crate::tape::Tape;

impl<F: Float + Serialize> Serialize for Tape<F> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Tape", 5)?;
        s.serialize_field("opcodes", &self.opcodes)?;
        s.serialize_field("arg_indices", &self.arg_indices)?;
        s.serialize_field("values", &self.values)?;
        s.serialize_field("ind_taddr", &self.ind_taddr)?;
        s.serialize_field("dep_taddr", &self.dep_taddr)?;
        s.end()
    }
}

impl<'de, F: Float + Deserialize<'de>> Deserialize<'de> for Tape<F> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct TapeData<F> {
            opcodes: Vec<OpCode>,
            arg_indices: Vec<[u32; 2]>,
            values: Vec<F>,
            ind_taddr: Vec<u32>,
            dep_taddr: Vec<u32>,
        }

        let data = TapeData::deserialize(deserializer)?;
        Ok(Tape {
            opcodes: data.opcodes,
            arg_indices: data.arg_indices,
            values: data.values,
            ind_taddr: data.ind_taddr,
            dep_taddr: data.dep_taddr,
        })
    }
}
