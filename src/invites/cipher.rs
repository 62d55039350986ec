use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::error::AppError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

// IV fijo: el mismo id produce siempre el mismo token. Aceptable porque el
// texto plano es una clave sustituta, no un secreto; el cifrado solo oculta
// la secuencia de ids.
const IV: [u8; 16] = [0u8; 16];

/// Cifrado reversible de ids de invitación a un token opaco apto para URL.
/// `decode(encode(x)) == x` para todo id válido; la salida nunca contiene
/// `+`, `/` ni `=`.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; 32],
}

impl TokenCipher {
    /// La clave simétrica se deriva de la clave maestra con SHA-256.
    pub fn new(secreto: &str) -> Self {
        Self {
            key: Sha256::digest(secreto.as_bytes()).into(),
        }
    }

    pub fn encode(&self, id_crudo: &str) -> String {
        let cifrado = Aes256CbcEnc::new(&self.key.into(), &IV.into())
            .encrypt_padded_vec_mut::<Pkcs7>(id_crudo.as_bytes());
        URL_SAFE_NO_PAD.encode(cifrado)
    }

    pub fn decode(&self, token: &str) -> Result<String, AppError> {
        let cifrado = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| token_invalido())?;
        let plano = Aes256CbcDec::new(&self.key.into(), &IV.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&cifrado)
            .map_err(|_| token_invalido())?;
        String::from_utf8(plano).map_err(|_| token_invalido())
    }
}

fn token_invalido() -> AppError {
    AppError::InvalidToken("Token de invitación inválido".to_string())
}
