use crate::variable::Variable;
use kusari_core::NdArray;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire form of a variable: array, flags and name. Graph edges and gradients
/// are runtime state and do not serialize.
#[derive(Serialize, Deserialize)]
struct SerializedVariable {
    data: Option<NdArray>,
    requires_grad: bool,
    name: Option<String>,
}

impl Serialize for Variable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        SerializedVariable {
            data: self.array(),
            requires_grad: self.requires_grad(),
            name: self.name(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let serialized = SerializedVariable::deserialize(deserializer)?;
        let var = match serialized.data {
            Some(array) => Variable::with_requires_grad(array, serialized.requires_grad),
            None => {
                let var = Variable::uninitialized();
                var.set_requires_grad(serialized.requires_grad);
                var
            }
        };
        if let Some(name) = serialized.name {
            var.set_name(name);
        }
        Ok(var)
    }
}
