//! Contract interaction helpers

use primitive_types::H160 as Address;
use serde::{Deserialize, Serialize};

use crate::abi::{decode_arguments, encode_arguments, parse_types, selector_of, AbiType, CallData, Token};
use crate::SdkError;

/// Parameter of a signature document entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name, may be empty
    #[serde(default)]
    pub name: String,
    /// Declared type string
    #[serde(rename = "type")]
    pub ty: String,
}

/// One entry of a compiler's full signature document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub name: String,
    /// `function` or `event`
    #[serde(rename = "type", default = "default_entry_kind")]
    pub kind: String,
    /// Declared inputs
    #[serde(default)]
    pub inputs: Vec<Param>,
    /// Declared outputs
    #[serde(default)]
    pub outputs: Vec<Param>,
}

fn default_entry_kind() -> String {
    "function".to_string()
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Function signature (e.g., "transfer(address,uint256)")
    pub signature: String,
    /// Function selector (4 bytes)
    pub selector: [u8; 4],
    /// Input parameter types
    pub inputs: Vec<AbiType>,
    /// Output parameter types
    pub outputs: Vec<AbiType>,
}

impl FunctionDef {
    /// Create a new function definition from declared type strings
    pub fn new<S: AsRef<str>>(name: &str, inputs: &[S], outputs: &[S]) -> Result<Self, SdkError> {
        let declared: Vec<&str> = inputs.iter().map(AsRef::as_ref).collect();
        let signature = format!("{}({})", name, declared.join(","));
        Ok(Self {
            name: name.to_string(),
            selector: selector_of(&signature),
            signature,
            inputs: parse_types(inputs)?,
            outputs: parse_types(outputs)?,
        })
    }

    /// Parse `name(t1,t2,...)`
    pub fn from_signature(signature: &str) -> Result<Self, SdkError> {
        let (name, params) = split_signature(signature)?;
        Self::new::<&str>(name, &params, &[])
    }

    fn from_entry(entry: &SignatureEntry) -> Result<Self, SdkError> {
        let (name, params) = split_signature(&entry.name)?;
        let outputs: Vec<&str> = entry.outputs.iter().map(|p| p.ty.as_str()).collect();
        Self::new(name, &params, &outputs)
    }

    /// Whether `args` fit this overload's arity and coarse type shape
    pub fn accepts(&self, args: &[Token]) -> bool {
        args.len() == self.inputs.len()
            && args.iter().zip(&self.inputs).all(|(arg, ty)| arg.matches_shape(ty))
    }

    /// Encode a call to this function
    pub fn encode(&self, args: &[Token]) -> Result<CallData, SdkError> {
        Ok(CallData::new(self.selector, encode_arguments(args, &self.inputs)?))
    }

    /// Decode function output
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>, SdkError> {
        if self.outputs.is_empty() {
            return Ok(Vec::new());
        }
        decode_arguments(&self.outputs, data)
    }
}

fn split_signature(signature: &str) -> Result<(&str, Vec<&str>), SdkError> {
    let invalid = || SdkError::InvalidTypeSyntax(format!("malformed signature: {}", signature));
    let (name, rest) = signature.split_once('(').ok_or_else(invalid)?;
    let params = rest.strip_suffix(')').ok_or_else(invalid)?;
    if name.is_empty() {
        return Err(invalid());
    }
    let params = if params.is_empty() {
        Vec::new()
    } else {
        params.split(',').collect()
    };
    Ok((name, params))
}

/// Contract helper for encoding/decoding function calls
#[derive(Debug, Clone, Default)]
pub struct Contract {
    /// Contract address
    address: Option<Address>,
    /// Function definitions
    functions: Vec<FunctionDef>,
}

impl Contract {
    /// Create a new contract helper
    pub fn new(address: Address) -> Self {
        Self {
            address: Some(address),
            functions: Vec::new(),
        }
    }

    /// Build from a signature document (JSON list of entries); events are skipped
    pub fn from_signature_document(address: Option<Address>, document: &str) -> Result<Self, SdkError> {
        let entries: Vec<SignatureEntry> = serde_json::from_str(document)?;
        Self::from_entries(address, &entries)
    }

    /// Build from parsed signature entries
    pub fn from_entries(address: Option<Address>, entries: &[SignatureEntry]) -> Result<Self, SdkError> {
        let functions = entries
            .iter()
            .filter(|e| e.kind == "function")
            .map(FunctionDef::from_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { address, functions })
    }

    /// Get the contract address
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Set the contract address
    pub fn at(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Add a function with builder pattern
    pub fn with_function(mut self, function: FunctionDef) -> Self {
        self.functions.push(function);
        self
    }

    /// All declared functions
    pub fn functions(&self) -> &[FunctionDef] {
        &self.functions
    }

    /// Every overload named exactly `name`
    pub fn overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FunctionDef> + 'a {
        self.functions.iter().filter(move |f| f.name == name)
    }

    /// Pick the single overload of `name` that accepts `args`.
    ///
    /// When exactly one overload has the right arity it is returned even if the
    /// shapes disagree, so the encoder reports the offending argument.
    pub fn resolve(&self, name: &str, args: &[Token]) -> Result<&FunctionDef, SdkError> {
        let named: Vec<&FunctionDef> = self.functions.iter().filter(|f| f.name == name).collect();
        if named.is_empty() {
            return Err(SdkError::UnknownFunction(name.to_string()));
        }

        let by_arity: Vec<&FunctionDef> = named
            .iter()
            .copied()
            .filter(|f| f.inputs.len() == args.len())
            .collect();
        match by_arity.as_slice() {
            [] => {
                return Err(SdkError::ArityMismatch {
                    expected: named[0].inputs.len(),
                    got: args.len(),
                })
            }
            [only] => return Ok(*only),
            _ => {}
        }

        let by_shape: Vec<&FunctionDef> = by_arity.into_iter().filter(|f| f.accepts(args)).collect();
        match by_shape.as_slice() {
            [only] => Ok(*only),
            [] => Err(SdkError::AbiEncode(format!(
                "no overload of {} accepts ({})",
                name,
                args.iter().map(Token::kind_name).collect::<Vec<_>>().join(",")
            ))),
            many => Err(SdkError::AmbiguousOverload {
                name: name.to_string(),
                candidates: many.iter().map(|f| f.signature.clone()).collect(),
            }),
        }
    }

    /// Encode a function call
    pub fn encode_call(&self, function_name: &str, args: &[Token]) -> Result<CallData, SdkError> {
        self.resolve(function_name, args)?.encode(args)
    }
}
