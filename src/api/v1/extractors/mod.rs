/*!
 * Request extractors
 *
 * Responsibility:
 * - 認証済みリクエストの Claims を handler に提供する
 */
mod claims;
